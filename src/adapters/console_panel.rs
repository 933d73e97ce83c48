use crate::domain::model::{Neighborhood, NeighborhoodId, PriceField, PriceRecord};
use crate::domain::ports::{DetailPanel, Notice};

/// Detail panel that logs to the console and remembers what it shows.
#[derive(Debug, Default)]
pub struct ConsolePanel {
    open: Option<(NeighborhoodId, String)>,
    record: Option<PriceRecord>,
    notices: Vec<Notice>,
}

impl ConsolePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn open_neighborhood(&self) -> Option<NeighborhoodId> {
        self.open.as_ref().map(|(id, _)| *id)
    }

    pub fn record(&self) -> Option<&PriceRecord> {
        self.record.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn last_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }

    /// Human-readable rendering of the open panel.
    pub fn render(&self) -> Option<String> {
        let (id, name) = self.open.as_ref()?;
        let record = self.record.as_ref()?;
        let mut lines = vec![format!("{} (#{})", name, id)];
        for field in PriceField::ALL {
            let value = record
                .get(field)
                .map(|v| v.to_string())
                .unwrap_or_default();
            lines.push(format!("  {:<24}{}", field.label(), value));
        }
        Some(lines.join("\n"))
    }
}

impl DetailPanel for ConsolePanel {
    fn open(&mut self, neighborhood: &Neighborhood, record: &PriceRecord) {
        tracing::info!("📋 Opening prices for '{}' ({})", neighborhood.name, neighborhood.id);
        self.open = Some((neighborhood.id, neighborhood.name.clone()));
        self.record = Some(record.clone());
    }

    fn refresh(&mut self, record: &PriceRecord) {
        if self.open.is_some() {
            self.record = Some(record.clone());
        }
    }

    fn close(&mut self) {
        self.open = None;
        self.record = None;
    }

    fn notify(&mut self, notice: Notice) {
        match &notice {
            Notice::Saved(id) => tracing::info!("✅ Prices saved for neighborhood {}", id),
            Notice::SaveFailed { id, message } => {
                tracing::error!("❌ Saving prices for neighborhood {} failed: {}", id, message)
            }
        }
        self.notices.push(notice);
    }
}
