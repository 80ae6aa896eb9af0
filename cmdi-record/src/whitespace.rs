use xot::{Node, NodeEdge, Value, Xot};

// Removes indentation: whitespace-only text nodes that sit between elements.
// Text-only content such as `<surname> </surname>` is kept, as is anything
// under xml:space="preserve".
pub(crate) fn strip_indentation(xot: &mut Xot, node: Node) {
    let mut to_remove = vec![];
    let mut xml_space_preserve = vec![];
    for edge in xot.traverse(node) {
        match edge {
            NodeEdge::Start(node) => match xot.value(node) {
                Value::Text(text) => {
                    if is_xml_whitespace(text.get())
                        && has_element_siblings(xot, node)
                        && !xml_space_preserve.last().copied().unwrap_or(false)
                    {
                        to_remove.push(node);
                    }
                }
                Value::Element(_) => {
                    if let Some(xml_space) = xot.attributes(node).get(xot.xml_space_name()) {
                        if xml_space == "preserve" {
                            xml_space_preserve.push(true);
                        } else if xml_space == "default" {
                            xml_space_preserve.push(false);
                        }
                    }
                }
                _ => {}
            },
            NodeEdge::End(node) => {
                if xot.is_element(node) && xot.attributes(node).get(xot.xml_space_name()).is_some()
                {
                    let _ = xml_space_preserve.pop();
                }
            }
        }
    }

    for node in to_remove {
        let _ = xot.remove(node);
    }
}

fn has_element_siblings(xot: &Xot, node: Node) -> bool {
    match xot.parent(node) {
        Some(parent) => xot.children(parent).any(|child| xot.is_element(child)),
        None => false,
    }
}

fn is_xml_whitespace_char(c: char) -> bool {
    matches!(c, '\u{9}' | '\u{A}' | '\u{D}' | '\u{20}')
}

fn is_xml_whitespace(s: &str) -> bool {
    s.chars().all(is_xml_whitespace_char)
}
