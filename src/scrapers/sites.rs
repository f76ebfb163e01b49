//! Known sites and the strategy chain each one uses.
//!
//! Selection is an ordered substring match of the source's domain hint or URL
//! against [`SITE_TABLE`]. The first match wins, so more specific patterns
//! must come before broader ones. Anything unmatched is [`Site::Generic`].
//!
//! Adding a site means one table row, one enum variant and one chain. Every
//! chain must end in a strategy that does not depend on the site's markup
//! staying the same.

use super::Strategy;
use super::listing::LinkPredicate;
use crate::models::Source;

/// A site with its own discovery rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    Buttondown,
    Deeplearn,
    HuggingFacePapers,
    TheBatch,
    Gigazine,
    Publickey,
    Ascii,
    Itmedia,
    AwsBlog,
    Generic,
}

/// Host patterns in match order.
pub const SITE_TABLE: [(&str, Site); 9] = [
    ("buttondown.com", Site::Buttondown),
    ("deeplearn.org", Site::Deeplearn),
    ("huggingface.co/papers", Site::HuggingFacePapers),
    ("deeplearning.ai/the-batch", Site::TheBatch),
    ("gigazine.net", Site::Gigazine),
    ("publickey1.jp", Site::Publickey),
    ("ascii.jp", Site::Ascii),
    ("itmedia.co.jp", Site::Itmedia),
    ("aws.amazon.com", Site::AwsBlog),
];

const GENERIC_LISTING: Strategy = Strategy::Pattern {
    predicate: LinkPredicate::NonEmpty,
    title_min_len: 15,
};

impl Site {
    /// Pick the site for `source`.
    pub fn select(source: &Source) -> Site {
        let domain = source.domain.as_deref().unwrap_or_default();
        SITE_TABLE
            .iter()
            .find(|(pattern, _)| {
                (!domain.is_empty() && domain.contains(pattern)) || source.url.contains(pattern)
            })
            .map(|(_, site)| *site)
            .unwrap_or(Site::Generic)
    }

    /// Strategies to try, in order, until one yields articles.
    pub fn chain(&self) -> Vec<Strategy> {
        match self {
            Site::Buttondown => vec![Strategy::Pattern {
                predicate: LinkPredicate::Contains("/archive/"),
                title_min_len: 10,
            }],
            Site::Deeplearn => vec![
                Strategy::Pattern {
                    predicate: LinkPredicate::Absolute,
                    title_min_len: 20,
                },
                Strategy::Containers {
                    class_tokens: &["post", "article"],
                    title_min_len: 5,
                },
            ],
            Site::HuggingFacePapers => vec![Strategy::Pattern {
                predicate: LinkPredicate::ContainsExcept {
                    needle: "/papers/",
                    except: &["/papers/trending"],
                },
                title_min_len: 10,
            }],
            Site::TheBatch => vec![Strategy::Pattern {
                predicate: LinkPredicate::Contains("/the-batch/"),
                title_min_len: 15,
            }],
            Site::Gigazine => vec![
                Strategy::Selectors {
                    css: "div.card h2 a, article h2 a, .content h2 a",
                    url_filter: Some(LinkPredicate::Contains("/news/")),
                    base: None,
                },
                Strategy::Pattern {
                    predicate: LinkPredicate::ContainsWithSuffix {
                        needle: "/news/",
                        suffix: ".html",
                    },
                    title_min_len: 10,
                },
            ],
            Site::Publickey => vec![
                Strategy::Selectors {
                    css: "article h2 a, .post-title a, h2.title a",
                    url_filter: None,
                    base: None,
                },
                Strategy::Pattern {
                    predicate: LinkPredicate::ContainsAny(&["/blog/", "/archives/"]),
                    title_min_len: 10,
                },
            ],
            Site::Ascii => vec![
                Strategy::Selectors {
                    css: "article a, .article-list a, h3 a, h2 a",
                    url_filter: Some(LinkPredicate::NumericSegment),
                    base: None,
                },
                Strategy::Pattern {
                    predicate: LinkPredicate::NumericSegment,
                    title_min_len: 10,
                },
            ],
            Site::Itmedia => vec![
                Strategy::Selectors {
                    css: "article a, .colBoxIndex a, h3 a",
                    url_filter: Some(LinkPredicate::Contains("/articles/")),
                    base: Some("https://www.itmedia.co.jp"),
                },
                Strategy::Pattern {
                    predicate: LinkPredicate::Contains("/articles/"),
                    title_min_len: 10,
                },
            ],
            Site::AwsBlog => vec![Strategy::KnownFeed, Strategy::FeedProbe, GENERIC_LISTING],
            Site::Generic => vec![Strategy::FeedProbe, GENERIC_LISTING],
        }
    }
}
