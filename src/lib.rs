//! Review harvesting from paginated hotel review pages.
//!
//! Sites are described declaratively (a comment selector, per-field
//! selectors, a record cap and per-language page URIs). Built-in rules cover
//! Booking.com and TripAdvisor; callers supply URIs and can add or override
//! sites. Records are kept per site and language and served from cache until
//! a refresh is forced.
//!
//! ```no_run
//! use harvest::config::{OrderedMap, Settings, SiteOverride};
//! use harvest::fetcher::HttpPageSource;
//! use harvest::harvester::Harvester;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::default();
//! let overrides: OrderedMap<SiteOverride> = [(
//!     "booking",
//!     SiteOverride::new().language_uri(
//!         "en",
//!         "http://www.booking.com/reviews/hr/hotel/waldinger.html?r_lang=en",
//!     ),
//! )]
//! .into_iter()
//! .collect();
//!
//! let source = Arc::new(HttpPageSource::new(settings.timeout)?);
//! let harvester = Harvester::new(source, overrides, &settings)?;
//! let harvest = harvester.site_comments("booking", false).await?;
//! for record in harvest.comments.get("en").into_iter().flatten() {
//!     println!("{} {:?}", record.id, record.content());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod harvester;
pub mod store;

pub use crate::error::{ScrapeError, TaskError};
pub use crate::extractor::ReviewRecord;
pub use crate::harvester::{Comments, Harvest, Harvester};
