//! Plain-text table and detail views of members.
//!
//! Everything here produces uncoloured text. Terminal styling is layered on
//! through [`Paint`], which only ever sees cells that are already padded, so
//! escape codes never disturb column alignment.

use crate::age::{Age, Presence, elapsed_secs};
use crate::member::Member;
use chrono::{DateTime, Utc};

pub const PLACEHOLDER: &str = "N/A";

const SEPARATOR: &str = " | ";
const LABEL_WIDTH: usize = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Address,
    Name,
    ManagedIps,
    LastSeen,
    Status,
    Version,
    Authorization,
}

const COLUMNS: [Column; 7] = [
    Column::Address,
    Column::Name,
    Column::ManagedIps,
    Column::LastSeen,
    Column::Status,
    Column::Version,
    Column::Authorization,
];

impl Column {
    fn title(self) -> &'static str {
        match self {
            Column::Address => "Address",
            Column::Name => "Device Name",
            Column::ManagedIps => "Managed IPs",
            Column::LastSeen => "Last Seen",
            Column::Status => "Status",
            Column::Version => "Version",
            Column::Authorization => "Authorization",
        }
    }

    fn width(self) -> usize {
        match self {
            Column::Address => 18,
            Column::Name => 25,
            Column::ManagedIps => 18,
            Column::LastSeen => 12,
            Column::Status => 8,
            Column::Version => 8,
            Column::Authorization => 13,
        }
    }
}

/// Styling hooks applied on top of the plain renderer.
pub trait Paint {
    fn header(&self, text: String) -> String {
        text
    }

    fn label(&self, text: String) -> String {
        text
    }

    fn placeholder(&self, text: String) -> String {
        text
    }

    fn presence(&self, _presence: Presence, text: String) -> String {
        text
    }

    fn authorization(&self, _authorized: bool, text: String) -> String {
        text
    }
}

/// No styling at all.
pub struct Plain;

impl Paint for Plain {}

/// One member flattened into display strings. `None` renders as [`PLACEHOLDER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRow {
    pub address: Option<String>,
    pub name: Option<String>,
    pub managed_ips: Option<String>,
    pub last_seen: Age,
    pub presence: Presence,
    pub version: Option<String>,
    pub authorized: bool,
}

impl MemberRow {
    pub fn new(member: &Member, now: DateTime<Utc>) -> Self {
        let elapsed = elapsed_secs(member.last_seen_ms(), now);
        let ips = member.ip_assignments().join(", ");
        MemberRow {
            address: present(Some(member.node_id.as_str())),
            name: present(member.name.as_deref()),
            managed_ips: present(Some(ips.as_str())),
            last_seen: Age::from_secs(elapsed),
            presence: Presence::from_secs(elapsed),
            version: present(member.client_version.as_deref()),
            authorized: member.is_authorized(),
        }
    }

    fn cell(&self, column: Column) -> Option<String> {
        match column {
            Column::Address => self.address.clone(),
            Column::Name => self.name.clone(),
            Column::ManagedIps => self.managed_ips.clone(),
            Column::LastSeen => Some(self.last_seen.to_string()),
            Column::Status => Some(self.presence.to_string()),
            Column::Version => self.version.clone(),
            Column::Authorization => Some(authorization_label(self.authorized).to_string()),
        }
    }
}

pub fn authorization_label(authorized: bool) -> &'static str {
    if authorized {
        "Authorized"
    } else {
        "Unauthorized"
    }
}

/// Trimmed value, or `None` when absent or blank.
fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn pad(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

/// Header, separator and one line per member, in input order.
pub fn render_table(members: &[Member], now: DateTime<Utc>, paint: &dyn Paint) -> String {
    let total_width = COLUMNS.iter().map(|c| c.width()).sum::<usize>()
        + SEPARATOR.len() * (COLUMNS.len() - 1);

    let header: Vec<String> = COLUMNS
        .iter()
        .map(|c| paint.header(pad(c.title(), c.width())))
        .collect();

    let mut out = String::new();
    out.push_str(header.join(SEPARATOR).trim_end());
    out.push('\n');
    out.push_str(&"-".repeat(total_width));
    out.push('\n');

    for member in members {
        let row = MemberRow::new(member, now);
        let cells: Vec<String> = COLUMNS
            .iter()
            .map(|&column| {
                let Some(raw) = row.cell(column) else {
                    return paint.placeholder(pad(PLACEHOLDER, column.width()));
                };
                let padded = pad(&raw, column.width());
                match column {
                    Column::Status => paint.presence(row.presence, padded),
                    Column::Authorization => paint.authorization(row.authorized, padded),
                    _ => padded,
                }
            })
            .collect();
        out.push_str(cells.join(SEPARATOR).trim_end());
        out.push('\n');
    }

    out
}

/// Labelled lines describing a single member.
pub fn render_detail(member: &Member, now: DateTime<Utc>, paint: &dyn Paint) -> String {
    let row = MemberRow::new(member, now);
    let seen_at = DateTime::<Utc>::from_timestamp_millis(member.last_seen_ms())
        .map(|dt| dt.format("%I:%M:%S %p %m-%d-%Y UTC").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    let lines = [
        ("Address", row.address.clone()),
        ("Name", row.name.clone()),
        ("Description", present(member.description.as_deref())),
        ("Physical Address", present(member.physical_address.as_deref())),
        ("Managed IPs", row.managed_ips.clone()),
        ("Last Seen", Some(format!("{} ({seen_at})", row.last_seen))),
        (
            "Status",
            Some(paint.presence(row.presence, row.presence.to_string())),
        ),
        ("Version", row.version.clone()),
        (
            "Authorization",
            Some(paint.authorization(row.authorized, authorization_label(row.authorized).into())),
        ),
    ];

    let mut out = String::new();
    for (label, value) in lines {
        let value = value.unwrap_or_else(|| paint.placeholder(PLACEHOLDER.to_string()));
        out.push_str(&paint.label(pad(&format!("{label}:"), LABEL_WIDTH)));
        out.push_str(&value);
        out.push('\n');
    }
    out
}
