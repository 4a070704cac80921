//! Gopher menu decoding: typed entry kinds, per-line parsing and the
//! end-of-text marker handling shared by the writer and the indexer.

/// Menu item types the crawler dispatches on. Everything else in the
/// type alphabet (images, search, telnet, ...) lands in `Other` and is
/// skipped by the traversal.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum EntryKind {
    TextFile,
    Directory,
    Error,
    BinaryFile,
    Info,
    Other(char),
}

impl From<char> for EntryKind {
    fn from(c: char) -> EntryKind {
        match c {
            '0' => Self::TextFile,
            '1' => Self::Directory,
            '3' => Self::Error,
            '9' => Self::BinaryFile,
            'i' => Self::Info,
            other => Self::Other(other),
        }
    }
}

/// One decoded line of a gopher menu.
#[derive(Debug, Clone)]
pub struct MenuEntry {
    pub kind: EntryKind,
    pub display: String,
    pub selector: String,
    pub host: String,
    pub port: u16,
}

impl MenuEntry {
    /// Decode a single menu line, `<type><display>\t<selector>\t<host>\t<port>`.
    ///
    /// Lines with no TAB at all (blank lines, the terminating `.`) are
    /// dropped silently; anything else that does not decompose into four
    /// fields with a numeric port is dropped with a log entry.
    pub fn parse(line: &str) -> Option<MenuEntry> {
        let line = line.trim_end_matches('\r');
        if !line.contains('\t') {
            return None;
        }

        let mut fields = line.split('\t');
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(kind_and_display), Some(selector), Some(host), Some(port)) => {
                let mut chars = kind_and_display.chars();
                let kind: EntryKind = match chars.next() {
                    Some(c) => c.into(),
                    None => {
                        log::warn!("menu line with empty type field: {:?}", line);
                        return None;
                    }
                };
                let display: String = chars.collect();
                let port: u16 = match port.trim().parse() {
                    Ok(p) => p,
                    Err(_) => {
                        log::error!("menu line with unparsable port {:?}: {:?}", port, line);
                        return None;
                    }
                };
                Some(MenuEntry {
                    kind,
                    display,
                    selector: selector.to_string(),
                    host: host.to_string(),
                    port,
                })
            }
            _ => {
                log::warn!("menu line with fewer than 4 fields: {:?}", line);
                None
            }
        }
    }
}

/// Decode a full menu response into entries, keeping source order.
/// Malformed rows are skipped one by one so a single bad line never
/// loses the rest of the directory.
pub fn parse_menu(body: &str) -> Vec<MenuEntry> {
    body.split('\n').filter_map(MenuEntry::parse).collect()
}

/// Strip the gopher end-of-text marker from a type-0 body, if the server
/// included one: a trailing `".\n"` loses both characters, otherwise a
/// trailing lone `"."` loses one. Menus are never stripped.
pub fn strip_terminator(text: &str) -> &str {
    if let Some(stripped) = text.strip_suffix(".\n") {
        stripped
    } else if let Some(stripped) = text.strip_suffix('.') {
        stripped
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_entries() {
        let e = MenuEntry::parse("1Test entry\t/test\texample.com\t70\r").unwrap();
        assert_eq!(e.kind, EntryKind::Directory);
        assert_eq!(e.display, "Test entry");
        assert_eq!(e.selector, "/test");
        assert_eq!(e.host, "example.com");
        assert_eq!(e.port, 70);
    }

    #[test]
    fn four_fields_accepted_three_rejected() {
        assert!(MenuEntry::parse("0hello\thello.txt\thost\t70").is_some());
        assert!(MenuEntry::parse("0hello\thello.txt\thost").is_none());
    }

    #[test]
    fn lines_without_tab_are_dropped_silently() {
        assert!(MenuEntry::parse("").is_none());
        assert!(MenuEntry::parse(".").is_none());
        assert!(MenuEntry::parse("just some text").is_none());
    }

    #[test]
    fn unparsable_port_is_dropped() {
        assert!(MenuEntry::parse("0hello\thello.txt\thost\tseventy").is_none());
        assert!(MenuEntry::parse("0hello\thello.txt\thost\t!").is_none());
    }

    #[test]
    fn info_entries_keep_placeholder_fields() {
        let e = MenuEntry::parse("iWelcome to the server\tfake\t(NULL)\t0").unwrap();
        assert_eq!(e.kind, EntryKind::Info);
        assert_eq!(e.display, "Welcome to the server");
    }

    #[test]
    fn unknown_types_are_preserved() {
        let e = MenuEntry::parse("gcat.gif\t/cat.gif\thost\t70").unwrap();
        assert_eq!(e.kind, EntryKind::Other('g'));
    }

    #[test]
    fn menu_keeps_source_order_and_skips_terminator() {
        let body = "0a\t/a\th\t70\r\n1b\t/b\th\t70\r\nbogus line\r\n.\r\n";
        let entries = parse_menu(body);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].selector, "/a");
        assert_eq!(entries[1].selector, "/b");
    }

    #[test]
    fn terminator_stripping() {
        assert_eq!(strip_terminator("hi."), "hi");
        assert_eq!(strip_terminator("hi.\n"), "hi");
        assert_eq!(strip_terminator("hi"), "hi");
        assert_eq!(strip_terminator("line 1\nline 2\n."), "line 1\nline 2\n");
        assert_eq!(strip_terminator(""), "");
        assert_eq!(strip_terminator("."), "");
    }
}
