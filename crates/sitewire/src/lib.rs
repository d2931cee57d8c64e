#![forbid(unsafe_code)]

//! sitewire: scroll-synchronized header, carousels, and accessible dialogs
//! for a single-page site.
//!
//! [`Site::install`] discovers everything from the page markup and returns a
//! handle that owns all listeners. Keep it alive for as long as the page
//! should stay interactive.
//!
//! ```
//! use sitewire::prelude::*;
//! use sitewire_harness::{FakeDocument, fixtures};
//!
//! let mut doc = FakeDocument::new();
//! let page = fixtures::page(&mut doc, &[("intro", 900.0), ("work", 900.0)]);
//! let bus = EventBus::new();
//! let site = Site::install(&mut doc, &bus, &SiteConfig::default());
//!
//! bus.run_frame(&mut doc);
//! assert_eq!(site.header().nav().active_link(&doc), Some(page.links[0]));
//! ```

pub use sitewire_core as core;
pub use sitewire_runtime as runtime;
pub use sitewire_widgets as widgets;

pub use sitewire_core::{ConfigError, Document, DomEvent, ElementId, SiteConfig};
pub use sitewire_runtime::EventBus;
pub use sitewire_widgets::{CarouselController, HeaderNavController, ModalController};

/// Everything an embedder usually needs.
pub mod prelude {
    pub use crate::Site;
    pub use sitewire_core::{
        ConfigError, Document, DomEvent, ElementId, EventKind, KeyCode, KeyEvent, Modifiers,
        SiteConfig, Target,
    };
    pub use sitewire_runtime::{EventBus, Subscription};
}

/// The installed controllers of one page.
#[derive(Debug)]
pub struct Site {
    header: HeaderNavController,
    carousels: Vec<CarouselController>,
    modal: Option<ModalController>,
}

impl Site {
    /// Install the header/nav synchronizer, every carousel, and the modal
    /// controller.
    ///
    /// Carousels measure immediately; the first header recomputation is
    /// queued on `bus` for the next animation frame.
    pub fn install(doc: &mut dyn Document, bus: &EventBus, config: &SiteConfig) -> Self {
        let header = HeaderNavController::install(doc, bus, config);
        let carousels = CarouselController::install_all(doc, bus, config);
        let modal = ModalController::install(doc, bus, config);
        tracing::info!(
            carousels = carousels.len(),
            modal = modal.is_some(),
            listeners = bus.listener_count(),
            "site installed"
        );
        Self {
            header,
            carousels,
            modal,
        }
    }

    /// Parse `json` as a [`SiteConfig`] and install with it.
    pub fn install_with_json(
        doc: &mut dyn Document,
        bus: &EventBus,
        json: &str,
    ) -> Result<Self, ConfigError> {
        let config = SiteConfig::from_json(json)?;
        Ok(Self::install(doc, bus, &config))
    }

    pub fn header(&self) -> &HeaderNavController {
        &self.header
    }

    pub fn carousels(&self) -> &[CarouselController] {
        &self.carousels
    }

    /// `None` when the page has no dialog openers.
    pub fn modal(&self) -> Option<&ModalController> {
        self.modal.as_ref()
    }
}
