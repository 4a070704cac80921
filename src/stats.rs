//! Counters and lists populated during the traversal, plus the
//! human-readable summary printed once the crawl is done.

/// Aggregate over one crawl. Owned and written by the indexer alone;
/// read afterwards by the report.
#[derive(Debug)]
pub struct CrawlStats {
    /// Full paths of text files persisted to disk, in traversal order.
    pub text_files: Vec<String>,
    /// Full paths of text fetches that came back empty or failed.
    pub bad_text_files: Vec<String>,
    /// Full paths of binary files persisted to disk, in traversal order.
    pub binary_files: Vec<String>,
    /// Full paths of binary fetches that came back empty or failed.
    pub bad_binary_files: Vec<String>,
    /// `host:port` of external directory references that accepted a connection.
    pub external_servers_up: Vec<String>,
    /// `host:port` of external directory references that refused one.
    pub external_servers_down: Vec<String>,
    /// Full paths of type-3 (error) references seen in menus.
    pub invalid_references: Vec<String>,

    pub smallest_text_size: u64,
    pub largest_text_size: u64,
    pub smallest_binary_size: u64,
    pub largest_binary_size: u64,
    /// Body of the currently smallest text file, replaced together with
    /// its size. First-seen wins on equal sizes.
    pub smallest_text_contents: Option<String>,
}

impl CrawlStats {
    pub fn new() -> CrawlStats {
        CrawlStats {
            text_files: Vec::new(),
            bad_text_files: Vec::new(),
            binary_files: Vec::new(),
            bad_binary_files: Vec::new(),
            external_servers_up: Vec::new(),
            external_servers_down: Vec::new(),
            invalid_references: Vec::new(),
            smallest_text_size: u64::MAX,
            largest_text_size: 0,
            smallest_binary_size: u64::MAX,
            largest_binary_size: 0,
            smallest_text_contents: None,
        }
    }

    /// Account one successfully persisted text file: the list append and
    /// the extrema fold happen as a unit. Callers must have verified
    /// `size > 0` (a zero-byte write never counts).
    pub fn record_text(&mut self, full_path: &str, size: u64, contents: &str) {
        self.text_files.push(full_path.to_string());
        if size < self.smallest_text_size {
            self.smallest_text_size = size;
            self.smallest_text_contents = Some(contents.to_string());
        }
        if size > self.largest_text_size {
            self.largest_text_size = size;
        }
    }

    /// Account one successfully persisted binary file.
    pub fn record_binary(&mut self, full_path: &str, size: u64) {
        self.binary_files.push(full_path.to_string());
        if size < self.smallest_binary_size {
            self.smallest_binary_size = size;
        }
        if size > self.largest_binary_size {
            self.largest_binary_size = size;
        }
    }
}

impl Default for CrawlStats {
    fn default() -> CrawlStats {
        CrawlStats::new()
    }
}

fn push_list(out: &mut String, heading: &str, items: &[String]) {
    out.push_str(&format!("{} ({})\n", heading, items.len()));
    for item in items {
        out.push_str(&format!("    {}\n", item));
    }
}

fn fmt_smallest(size: u64) -> String {
    if size == u64::MAX {
        String::from("n/a")
    } else {
        format!("{} bytes", size)
    }
}

fn fmt_largest(size: u64, any: bool) -> String {
    if any {
        format!("{} bytes", size)
    } else {
        String::from("n/a")
    }
}

/// Render the end-of-crawl report.
pub fn render_report(stats: &CrawlStats, visited: usize) -> String {
    let mut out = String::new();
    out.push_str("==== crawl report ====\n");
    out.push_str(&format!("directories visited: {}\n", visited));

    push_list(&mut out, "text files downloaded", &stats.text_files);
    push_list(&mut out, "text files unavailable", &stats.bad_text_files);
    push_list(&mut out, "binary files downloaded", &stats.binary_files);
    push_list(&mut out, "binary files unavailable", &stats.bad_binary_files);

    out.push_str(&format!(
        "smallest text file: {}\n",
        fmt_smallest(stats.smallest_text_size)
    ));
    if let Some(contents) = &stats.smallest_text_contents {
        out.push_str(&format!("smallest text contents:\n{}\n", contents));
    }
    out.push_str(&format!(
        "largest text file: {}\n",
        fmt_largest(stats.largest_text_size, !stats.text_files.is_empty())
    ));
    out.push_str(&format!(
        "smallest binary file: {}\n",
        fmt_smallest(stats.smallest_binary_size)
    ));
    out.push_str(&format!(
        "largest binary file: {}\n",
        fmt_largest(stats.largest_binary_size, !stats.binary_files.is_empty())
    ));

    push_list(
        &mut out,
        "external servers up",
        &stats.external_servers_up,
    );
    push_list(
        &mut out,
        "external servers down",
        &stats.external_servers_down,
    );
    push_list(
        &mut out,
        "invalid references",
        &stats.invalid_references,
    );
    out
}
