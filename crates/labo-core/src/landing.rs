//! Post-login routing.

use serde::{Deserialize, Serialize};

/// Where a signed-in user starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landing {
  Dashboard,
  MemberList,
}

/// The administrator lands on the dashboard; everyone else on the member
/// list. Addresses compare trimmed and case-insensitively.
pub fn landing_for(email: &str, admin_email: &str) -> Landing {
  if email.trim().eq_ignore_ascii_case(admin_email.trim()) {
    Landing::Dashboard
  } else {
    Landing::MemberList
  }
}
