//! Content lookups against the WordPress REST API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::application::ports::{ContentError, ContentSource};
use crate::domain::content::ContentItem;
use crate::infra::error::{InfraError, Upstream};

const EMBED: &str = "author,wp:term";
const CATEGORY_TAXONOMY: &str = "category";
const TAG_TAXONOMY: &str = "post_tag";

#[derive(Debug, Deserialize)]
struct WpPost {
    id: u64,
    slug: String,
    link: String,
    #[serde(default, rename = "_embedded")]
    embedded: WpEmbedded,
}

#[derive(Debug, Default, Deserialize)]
struct WpEmbedded {
    #[serde(default)]
    author: Vec<WpAuthor>,
    #[serde(default, rename = "wp:term")]
    terms: Vec<Vec<WpTerm>>,
}

#[derive(Debug, Deserialize)]
struct WpAuthor {
    #[serde(default)]
    slug: String,
}

#[derive(Debug, Deserialize)]
struct WpTerm {
    slug: String,
    taxonomy: String,
}

impl WpPost {
    fn into_item(self) -> ContentItem {
        let author_nicename = self
            .embedded
            .author
            .into_iter()
            .next()
            .map(|author| author.slug)
            .unwrap_or_default();

        let mut categories = Vec::new();
        let mut tags = Vec::new();
        for term in self.embedded.terms.into_iter().flatten() {
            match term.taxonomy.as_str() {
                CATEGORY_TAXONOMY => categories.push(term.slug),
                TAG_TAXONOMY => tags.push(term.slug),
                _ => {}
            }
        }

        ContentItem {
            id: self.id,
            slug: self.slug,
            permalink: self.link,
            author_nicename,
            categories,
            tags,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WordPressContentSource {
    http: Client,
    api_base: Url,
}

impl WordPressContentSource {
    /// `api_base` is the REST root, e.g. `https://internal.site/wp-json`.
    pub fn new(api_base: &str) -> Result<Self, InfraError> {
        let mut api_base = Url::parse(api_base.trim())
            .map_err(|err| InfraError::invalid_url(Upstream::WordPress, api_base, err))?;
        if !api_base.path().ends_with('/') {
            let path = format!("{}/", api_base.path());
            api_base.set_path(&path);
        }

        let http = Client::builder()
            .user_agent(concat!("purge-cache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| InfraError::HttpClient {
                upstream: Upstream::WordPress,
                source,
            })?;

        Ok(Self { http, api_base })
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ContentError> {
        let mut url = self.api_base.join(path).map_err(ContentError::from_source)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, url: Url) -> Result<Option<T>, ContentError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(ContentError::from_source)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ContentError::Source(format!(
                "WordPress responded with status {status}"
            )));
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(ContentError::from_source)
    }
}

#[async_trait]
impl ContentSource for WordPressContentSource {
    async fn find_item(&self, id: u64) -> Result<ContentItem, ContentError> {
        let url = self.url(&format!("wp/v2/posts/{id}"), &[("_embed", EMBED)])?;
        self.get::<WpPost>(url)
            .await?
            .map(WpPost::into_item)
            .ok_or(ContentError::NotFound { id })
    }

    async fn latest_published(&self) -> Result<ContentItem, ContentError> {
        let url = self.url(
            "wp/v2/posts",
            &[
                ("per_page", "1"),
                ("status", "publish"),
                ("orderby", "date"),
                ("order", "desc"),
                ("_embed", EMBED),
            ],
        )?;
        self.get::<Vec<WpPost>>(url)
            .await?
            .and_then(|posts| posts.into_iter().next())
            .map(WpPost::into_item)
            .ok_or(ContentError::NoPublished)
    }
}
