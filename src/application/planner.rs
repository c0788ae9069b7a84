//! Purge request planning.
//!
//! Decides between a whole-zone purge and a targeted file list for a content
//! change, and assembles the file list in a fixed order:
//!
//! 1. the item's permalink, rewritten onto the public origin
//! 2. the public homepage (when enabled)
//! 3. every additional template line, expanded against the item
//!
//! Duplicates are removed keeping the first occurrence. Entries that are not
//! absolute http(s) URLs are dropped.

use std::collections::HashSet;

use tracing::debug;
use url::Url;

use crate::domain::content::ContentItem;
use crate::domain::placeholders;
use crate::domain::purge::{PurgeConfig, PurgeRequest};

const TARGET: &str = "purge_cache::planner";

/// Build the purge request for `trigger` under `config`.
///
/// No trigger, or a config that forces whole-zone purges, short-circuits to
/// [`PurgeRequest::Everything`] without computing any URL. An empty file list
/// stays a file list.
pub fn build(trigger: Option<&ContentItem>, config: &PurgeConfig) -> PurgeRequest {
    let item = match trigger {
        Some(item) if !config.purge_everything_on_update => item,
        _ => return PurgeRequest::Everything,
    };

    let frontend_url = config.frontend_url.trim();
    let mut candidates = Vec::new();

    let page_url = rewrite_permalink(&item.permalink, &config.site_url, frontend_url);
    if is_absolute_url(&page_url) {
        candidates.push(page_url);
    } else {
        debug!(
            target: TARGET,
            post_id = item.id,
            url = %page_url,
            "dropping malformed permalink"
        );
    }

    if config.purge_home_on_update && !frontend_url.is_empty() {
        candidates.push(frontend_url.to_string());
    }

    for template in &config.additional_url_templates {
        for url in placeholders::expand(template, item) {
            if is_absolute_url(&url) {
                candidates.push(url);
            } else {
                debug!(
                    target: TARGET,
                    post_id = item.id,
                    template = %template,
                    url = %url,
                    "dropping malformed template url"
                );
            }
        }
    }

    PurgeRequest::FileList(dedupe(candidates))
}

/// Swap the internal origin for the public one and strip one trailing slash.
///
/// Both origins are compared without trailing slashes so the separator
/// between host and path survives the swap.
fn rewrite_permalink(permalink: &str, site_url: &str, frontend_url: &str) -> String {
    let site_url = site_url.trim().trim_end_matches('/');
    let frontend_url = frontend_url.trim_end_matches('/');
    let rewritten = if site_url.is_empty() {
        permalink.to_string()
    } else {
        permalink.replace(site_url, frontend_url)
    };

    match rewritten.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => rewritten,
    }
}

fn is_absolute_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

fn dedupe(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Split a multi-line template field into lines, accepting any line ending.
pub fn split_templates(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    raw.split("\r\n")
        .flat_map(|line| line.split(['\n', '\r']))
        .map(str::to_string)
        .collect()
}
