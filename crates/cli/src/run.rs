//! Outlet loop: resolve → fetch → aggregate → deliver, once per tenant.

use std::fmt;

use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_decimal::Decimal;

use mallfeed_core::{aggregate, SalesFile, Tenant, TransactionRecord};
use mallfeed_pos_client::{DateWindow, PosClient, PosError};

use crate::delivery::{deliver, DeliveryError, DeliveryPolicy, Outcome, Uploader};

/// Where receipts come from. `PosClient` in production.
pub trait SalesSource {
    fn resolve_store(&self, name: &str) -> Result<String, PosError>;
    fn receipts(&self, store_id: &str, window: &DateWindow)
        -> Result<Vec<TransactionRecord>, PosError>;
}

impl SalesSource for PosClient {
    fn resolve_store(&self, name: &str) -> Result<String, PosError> {
        self.resolve_store_id(name)
    }

    fn receipts(
        &self,
        store_id: &str,
        window: &DateWindow,
    ) -> Result<Vec<TransactionRecord>, PosError> {
        self.fetch_receipts(store_id, window)
    }
}

/// Why one outlet was skipped. Never stops the other outlets.
#[derive(Debug)]
pub enum OutletError {
    /// No unique store for the tenant name.
    Resolution(PosError),
    /// Receipts could not be fetched completely.
    Fetch(PosError),
    /// Local write, transfer or SFTP auth failed.
    Delivery(DeliveryError),
}

impl fmt::Display for OutletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutletError::Resolution(e) => write!(f, "store lookup failed: {}", e),
            OutletError::Fetch(e) => write!(f, "receipt fetch failed: {}", e),
            OutletError::Delivery(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for OutletError {}

#[derive(Debug)]
pub enum OutletStatus {
    /// Pushed to the mall's server.
    Submitted,
    /// Written locally only (dry run).
    Generated,
    Failed(OutletError),
}

#[derive(Debug)]
pub struct OutletReport {
    pub tenant: Tenant,
    pub net_amount: Option<Decimal>,
    pub file_name: Option<String>,
    pub status: OutletStatus,
}

#[derive(Debug)]
pub struct RunSummary {
    pub business_date: NaiveDate,
    pub outlets: Vec<OutletReport>,
}

impl RunSummary {
    pub fn submitted(&self) -> usize {
        self.count(|s| matches!(s, OutletStatus::Submitted))
    }

    pub fn generated(&self) -> usize {
        self.count(|s| matches!(s, OutletStatus::Generated))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, OutletStatus::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&OutletStatus) -> bool) -> usize {
        self.outlets.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Process every tenant for `business_date`, in list order.
///
/// `uploader == None` is a dry run: files are written and kept.
pub fn run_outlets(
    tenants: &[Tenant],
    business_date: NaiveDate,
    timezone: Tz,
    source: &dyn SalesSource,
    uploader: Option<&dyn Uploader>,
    policy: &DeliveryPolicy,
) -> RunSummary {
    let window = DateWindow::for_business_date(business_date, timezone);
    tracing::debug!(
        created_at_min = %window.created_at_min(),
        created_at_max = %window.created_at_max(),
        "business day window"
    );

    let outlets = tenants
        .iter()
        .map(|tenant| {
            let span = tracing::info_span!("outlet", lot = %tenant.lot_code);
            let _enter = span.enter();
            run_outlet(tenant, business_date, &window, source, uploader, policy)
        })
        .collect();

    let summary = RunSummary { business_date, outlets };
    tracing::info!(
        date = %business_date,
        outlets = summary.outlets.len(),
        submitted = summary.submitted(),
        generated = summary.generated(),
        failed = summary.failed(),
        "run complete"
    );
    summary
}

fn run_outlet(
    tenant: &Tenant,
    business_date: NaiveDate,
    window: &DateWindow,
    source: &dyn SalesSource,
    uploader: Option<&dyn Uploader>,
    policy: &DeliveryPolicy,
) -> OutletReport {
    let mut report = OutletReport {
        tenant: tenant.clone(),
        net_amount: None,
        file_name: None,
        status: OutletStatus::Generated,
    };

    let store_id = match source.resolve_store(&tenant.name) {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("cannot find store {:?}: {}", tenant.name, e);
            report.status = OutletStatus::Failed(OutletError::Resolution(e));
            return report;
        }
    };

    let records = match source.receipts(&store_id, window) {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("cannot fetch receipts of {:?}: {}", tenant.name, e);
            report.status = OutletStatus::Failed(OutletError::Fetch(e));
            return report;
        }
    };

    let result = aggregate(tenant, business_date, &records);
    tracing::info!(
        tenant = %tenant.name,
        receipts = records.len(),
        "net sales {}",
        result.net_amount
    );
    report.net_amount = Some(result.net_amount);

    let file = SalesFile::render(&result);
    report.file_name = Some(file.name.clone());

    report.status = match deliver(&file, policy, uploader) {
        Ok(delivered) => match delivered.outcome {
            Outcome::Delivered { .. } => OutletStatus::Submitted,
            Outcome::Retained => OutletStatus::Generated,
        },
        Err(e) => OutletStatus::Failed(OutletError::Delivery(e)),
    };
    report
}
