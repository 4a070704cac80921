//! Depth-first traversal of an origin server's menu tree: directories on
//! the origin are recursed into, files are downloaded, references to
//! other servers are probed but never followed.

use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::gopher::{self, EntryKind, MenuEntry};
use crate::stats::CrawlStats;
use crate::storage;
use crate::transport::{Connection, TransportError};

pub struct Crawler {
    origin_host: String,
    origin_port: u16,
    max_depth: usize,
    download_root: PathBuf,
    visited: HashSet<String>,
    probed: HashSet<String>,
    stats: CrawlStats,
}

impl Crawler {
    pub fn new(origin_host: &str, origin_port: u16, download_root: impl Into<PathBuf>) -> Crawler {
        Crawler {
            origin_host: origin_host.to_string(),
            origin_port,
            max_depth: usize::MAX,
            download_root: download_root.into(),
            visited: HashSet::new(),
            probed: HashSet::new(),
            stats: CrawlStats::new(),
        }
    }

    /// Cap the recursion depth. The root menu sits at depth 0, so a cap
    /// of 0 indexes the root directory and nothing below it.
    pub fn with_max_depth(mut self, max_depth: usize) -> Crawler {
        self.max_depth = max_depth;
        self
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Distinct directories visited over the whole crawl.
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Walk the entire tree under `root_selector` and populate the stats.
    ///
    /// Failures below the root are absorbed into the stats and logs; only
    /// a failure to fetch the root menu itself is returned.
    pub async fn crawl(&mut self, root_selector: &str) -> Result<(), TransportError> {
        self.visited.insert(self.resource_key(root_selector));
        log::info!(
            "indexing gopher://{}:{}/ from selector {:?}",
            self.origin_host,
            self.origin_port,
            root_selector
        );
        let menu = self.fetch_menu(root_selector).await?;
        if menu.is_empty() {
            log::warn!("origin returned an empty root menu");
            return Ok(());
        }
        self.index_menu(&menu, "", 0).await;
        Ok(())
    }

    fn resource_key(&self, selector: &str) -> String {
        format!("{}:{}{}", self.origin_host, self.origin_port, selector)
    }

    fn is_origin(&self, entry: &MenuEntry) -> bool {
        // string equality on purpose: a CNAME for the origin is treated
        // as a foreign server and probed instead of descended
        entry.host == self.origin_host && entry.port == self.origin_port
    }

    async fn fetch_menu(&self, selector: &str) -> Result<String, TransportError> {
        let conn = Connection::open(&self.origin_host, self.origin_port).await?;
        conn.send_request(selector).await
    }

    /// Visit one directory on the origin server: dedup, fetch, recurse.
    fn walk<'a>(
        &'a mut self,
        selector: String,
        full_path: String,
        depth: usize,
    ) -> Pin<Box<dyn Future<Output = ()> + 'a>> {
        Box::pin(async move {
            if !self.visited.insert(self.resource_key(&selector)) {
                return;
            }
            log::info!("indexing directory {:?} at depth {}", selector, depth);
            let menu = match self.fetch_menu(&selector).await {
                Ok(menu) => menu,
                Err(err) => {
                    log::warn!("menu fetch for {:?} failed: {}", selector, err);
                    return;
                }
            };
            if menu.is_empty() {
                log::warn!("empty menu for selector {:?}", selector);
                return;
            }
            self.index_menu(&menu, &full_path, depth).await;
        })
    }

    async fn index_menu(&mut self, menu: &str, parent_path: &str, depth: usize) {
        for entry in gopher::parse_menu(menu) {
            let child_path = format!("{}{}", parent_path, entry.selector);
            match entry.kind {
                EntryKind::Info => {}
                EntryKind::Directory => {
                    if self.is_origin(&entry) {
                        if depth >= self.max_depth {
                            log::info!(
                                "depth limit {} reached, not descending into {:?}",
                                self.max_depth,
                                child_path
                            );
                        } else {
                            self.walk(entry.selector, child_path, depth + 1).await;
                        }
                    } else {
                        self.probe_external(&entry).await;
                    }
                }
                EntryKind::TextFile => self.fetch_text(&entry, child_path).await,
                EntryKind::BinaryFile => self.fetch_binary(&entry, child_path).await,
                EntryKind::Error => {
                    log::warn!("server flagged {:?} as an error reference", child_path);
                    self.stats.invalid_references.push(child_path);
                }
                EntryKind::Other(_) => {}
            }
        }
    }

    /// Probe a directory reference on a foreign server, once per distinct
    /// `(host, port, selector)`. The reference is classified by whether
    /// the connect succeeds; it is never descended into.
    async fn probe_external(&mut self, entry: &MenuEntry) {
        let key = format!("{}:{}{}", entry.host, entry.port, entry.selector);
        if !self.probed.insert(key) {
            return;
        }
        let server = format!("{}:{}", entry.host, entry.port);
        log::info!("probing external server {}", server);
        if Connection::probe(&entry.host, entry.port).await {
            self.stats.external_servers_up.push(server);
        } else {
            self.stats.external_servers_down.push(server);
        }
    }

    async fn fetch_text(&mut self, entry: &MenuEntry, child_path: String) {
        log::info!("fetching text file {:?}", child_path);
        let fetched = match Connection::open(&entry.host, entry.port).await {
            Ok(conn) => conn.send_request(&entry.selector).await,
            Err(err) => Err(err),
        };
        match fetched {
            Ok(body) if !body.is_empty() => {
                let size = storage::write_text(&self.download_root, &child_path, &body);
                if size > 0 {
                    self.stats
                        .record_text(&child_path, size, gopher::strip_terminator(&body));
                }
            }
            Ok(_) => {
                log::warn!("empty text body for {:?}", child_path);
                self.stats.bad_text_files.push(child_path);
            }
            Err(err) => {
                log::warn!("text fetch for {:?} failed: {}", child_path, err);
                self.stats.bad_text_files.push(child_path);
            }
        }
    }

    async fn fetch_binary(&mut self, entry: &MenuEntry, child_path: String) {
        log::info!("fetching binary file {:?}", child_path);
        let fetched = match Connection::open(&entry.host, entry.port).await {
            Ok(conn) => conn.read_binary(&entry.selector).await,
            Err(err) => Err(err),
        };
        match fetched {
            Ok(payload) if !payload.is_empty() => {
                let size = storage::write_binary(&self.download_root, &child_path, &payload);
                if size > 0 {
                    self.stats.record_binary(&child_path, size);
                }
            }
            Ok(_) => {
                log::warn!("empty binary body for {:?}", child_path);
                self.stats.bad_binary_files.push(child_path);
            }
            Err(err) => {
                log::warn!("binary fetch for {:?} failed: {}", child_path, err);
                self.stats.bad_binary_files.push(child_path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: EntryKind, selector: &str, host: &str, port: u16) -> MenuEntry {
        MenuEntry {
            kind,
            display: String::new(),
            selector: selector.to_string(),
            host: host.to_string(),
            port,
        }
    }

    #[test]
    fn resource_keys_concatenate_endpoint_and_selector() {
        let crawler = Crawler::new("origin", 70, "downloads");
        assert_eq!(crawler.resource_key(""), "origin:70");
        assert_eq!(crawler.resource_key("/docs"), "origin:70/docs");
    }

    #[test]
    fn origin_test_requires_host_and_port_equality() {
        let crawler = Crawler::new("origin", 70, "downloads");
        let e = entry(EntryKind::Directory, "/", "origin", 70);
        assert!(crawler.is_origin(&e));
        assert!(!crawler.is_origin(&entry(EntryKind::Directory, "/", "origin", 7070)));
        assert!(!crawler.is_origin(&entry(EntryKind::Directory, "/", "mirror", 70)));
    }

    #[test]
    fn depth_is_unbounded_unless_capped() {
        let crawler = Crawler::new("origin", 70, "downloads");
        assert_eq!(crawler.max_depth, usize::MAX);
        let capped = Crawler::new("origin", 70, "downloads").with_max_depth(2);
        assert_eq!(capped.max_depth, 2);
    }
}
