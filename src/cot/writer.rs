//! Event record serialization.

use super::event::{CotEvent, Detail, EventPoint, ERROR_UNKNOWN};
use crate::error::{Error, Result};
use crate::extract::Coord;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Fixed declaration line of every output record.
pub const COT_DECLARATION: &str = "<?xml version='1.0' encoding='UTF-8' standalone='yes'?>";

/// Serialize an event record to output text.
pub fn to_xml(event: &CotEvent) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    let time = timestamp(event.time);
    let stale = timestamp(event.stale);

    let mut root = BytesStart::new("event");
    root.push_attribute(("version", "2.0"));
    root.push_attribute(("uid", event.uid.as_str()));
    root.push_attribute(("type", event.event_type.as_str()));
    root.push_attribute(("time", time.as_str()));
    root.push_attribute(("start", time.as_str()));
    root.push_attribute(("stale", stale.as_str()));
    root.push_attribute(("how", event.how));
    writer.write_event(Event::Start(root))?;

    write_point(&mut writer, &event.point)?;

    writer.write_event(Event::Start(BytesStart::new("detail")))?;
    match &event.detail {
        Detail::Point {
            callsign,
            remarks,
            argb,
            icon_path,
        } => {
            write_empty(&mut writer, "status", &[("readiness", "true")])?;
            write_empty(&mut writer, "archive", &[])?;
            write_empty(&mut writer, "contact", &[("callsign", callsign)])?;
            if let Some(remarks) = remarks {
                write_remarks(&mut writer, remarks)?;
            }
            write_empty(&mut writer, "color", &[("argb", argb.to_string().as_str())])?;
            write_empty(&mut writer, "precisionlocation", &[("altsrc", "???")])?;
            if let Some(path) = icon_path {
                write_empty(&mut writer, "usericon", &[("iconsetpath", path)])?;
            }
        }
        Detail::Line {
            links,
            stroke_argb,
            stroke_weight,
            color_rgb,
            callsign,
            remarks,
        } => {
            write_links(&mut writer, links)?;
            write_stroke(&mut writer, *stroke_argb, *stroke_weight)?;
            write_empty(&mut writer, "contact", &[("callsign", callsign)])?;
            if let Some(remarks) = remarks {
                write_remarks(&mut writer, remarks)?;
            }
            write_empty(&mut writer, "archive", &[])?;
            write_empty(&mut writer, "labels_on", &[("value", "false")])?;
            if let Some(rgb) = color_rgb {
                write_empty(&mut writer, "color", &[("value", rgb)])?;
            }
            write_empty(&mut writer, "precisionlocation", &[("altsrc", "???")])?;
        }
        Detail::Polygon {
            links,
            stroke_argb,
            stroke_weight,
            fill_argb,
            color_rgb,
            callsign,
            remarks,
        } => {
            write_links(&mut writer, links)?;
            write_stroke(&mut writer, *stroke_argb, *stroke_weight)?;
            write_empty(
                &mut writer,
                "fillColor",
                &[("value", fill_argb.to_string().as_str())],
            )?;
            write_empty(&mut writer, "contact", &[("callsign", callsign)])?;
            if let Some(remarks) = remarks {
                write_remarks(&mut writer, remarks)?;
            }
            write_empty(&mut writer, "archive", &[])?;
            write_empty(&mut writer, "labels_on", &[("value", "false")])?;
            if let Some(rgb) = color_rgb {
                write_empty(&mut writer, "color", &[("value", rgb)])?;
            }
            write_empty(&mut writer, "precisionlocation", &[("altsrc", "???")])?;
        }
    }
    writer.write_event(Event::End(BytesEnd::new("detail")))?;
    writer.write_event(Event::End(BytesEnd::new("event")))?;

    let body = String::from_utf8(writer.into_inner())
        .map_err(|e| Error::Serialize(e.to_string()))?;
    Ok(format!("{COT_DECLARATION}\n{body}\n"))
}

fn write_point<W: std::io::Write>(writer: &mut Writer<W>, point: &EventPoint) -> Result<()> {
    let error = fmt_float(ERROR_UNKNOWN);
    let mut element = BytesStart::new("point");
    element.push_attribute(("lat", fmt_float(point.lat).as_str()));
    element.push_attribute(("lon", fmt_float(point.lon).as_str()));
    element.push_attribute(("hae", fmt_float(point.hae).as_str()));
    element.push_attribute(("ce", error.as_str()));
    element.push_attribute(("le", error.as_str()));
    writer.write_event(Event::Empty(element))?;
    Ok(())
}

fn write_links<W: std::io::Write>(writer: &mut Writer<W>, links: &[Coord]) -> Result<()> {
    for link in links {
        let point = format!(
            "{},{},{}",
            fmt_float(link.lat),
            fmt_float(link.lon),
            fmt_float(link.hae)
        );
        write_empty(writer, "link", &[("point", point.as_str())])?;
    }
    Ok(())
}

fn write_stroke<W: std::io::Write>(writer: &mut Writer<W>, argb: i32, weight: f64) -> Result<()> {
    write_empty(writer, "strokeColor", &[("value", argb.to_string().as_str())])?;
    write_empty(
        writer,
        "strokeWeight",
        &[("value", fmt_float(weight).as_str())],
    )
}

fn write_remarks<W: std::io::Write>(writer: &mut Writer<W>, remarks: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("remarks")))?;
    writer.write_event(Event::Text(BytesText::new(remarks)))?;
    writer.write_event(Event::End(BytesEnd::new("remarks")))?;
    Ok(())
}

fn write_empty<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    attrs: &[(&str, &str)],
) -> Result<()> {
    let mut element = BytesStart::new(name);
    for attr in attrs {
        element.push_attribute(*attr);
    }
    writer.write_event(Event::Empty(element))?;
    Ok(())
}

/// Format a timestamp with microsecond precision and a literal Z suffix.
fn timestamp(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Format a float the way the target client expects: integral values
/// keep one decimal digit (`0.0`, not `0`), everything else prints at
/// full precision.
fn fmt_float(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
