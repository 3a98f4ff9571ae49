//! Recovering parse pass.
//!
//! Rebuilds a well-formed document from the event stream of a malformed
//! one. Unmatched end tags are dropped, unclosed elements are closed
//! where their parent ends, and anything after an unsalvageable syntax
//! error is discarded. The result is parsed strictly by the caller.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Rebuild `input` into well-formed XML, dropping malformed fragments.
pub(crate) fn rebuild(input: &str) -> String {
    let mut reader = Reader::from_str(input);
    reader.config_mut().check_end_names = false;

    let mut out = String::with_capacity(input.len());
    let mut stack: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Decl(_)) => {
                if out.is_empty() {
                    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
                }
            }
            Ok(Event::Start(e)) => {
                out.push('<');
                out.push_str(&String::from_utf8_lossy(&e));
                out.push('>');
                stack.push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
            }
            Ok(Event::Empty(e)) => {
                out.push('<');
                out.push_str(&String::from_utf8_lossy(&e));
                out.push_str("/>");
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match stack.iter().rposition(|open| *open == name) {
                    Some(pos) => {
                        // Close elements left open inside this one.
                        while stack.len() > pos {
                            let open = stack.pop().unwrap();
                            out.push_str("</");
                            out.push_str(&open);
                            out.push('>');
                        }
                    }
                    None => {
                        log::debug!("recovery dropped unmatched end tag </{name}>");
                    }
                }
            }
            Ok(Event::Text(e)) => {
                out.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::CData(e)) => {
                out.push_str("<![CDATA[");
                out.push_str(&String::from_utf8_lossy(&e.into_inner()));
                out.push_str("]]>");
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                log::debug!("recovery stopped at malformed fragment: {err}");
                break;
            }
        }
    }

    while let Some(open) = stack.pop() {
        out.push_str("</");
        out.push_str(&open);
        out.push('>');
    }
    out
}
