//! Named choices for how bookings move vehicle and driver availability.
//!
//! The defaults reproduce the historical back-office behavior; the other
//! variants are opt-in through configuration.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// What cancelling a booking does to its vehicle and driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    /// Both go back to `READY`, whatever their current state.
    #[default]
    AlwaysResetsAvailability,
    /// A vehicle in maintenance or an off-duty driver is left alone.
    PreserveOutOfService,
}

/// What editing a booking's vehicle or driver does to availability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReassignPolicy {
    /// Only the booking row changes.
    #[default]
    DoesNotTouchAvailability,
    /// The old resource is released and the new one claimed in the same batch.
    TransferAvailability,
}

/// Whether claiming a resource requires it to be `READY`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentGuard {
    #[default]
    Unchecked,
    RequireReady,
}

macro_rules! policy_str {
    ($ty:ty, $label:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = EngineError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
                    $($name => Ok(Self::$variant),)+
                    other => Err(EngineError::Validation(format!(
                        concat!("unknown ", $label, ": {}"),
                        other
                    ))),
                }
            }
        }
    };
}

policy_str!(CancelPolicy, "cancel policy", {
    AlwaysResetsAvailability => "always_resets_availability",
    PreserveOutOfService => "preserve_out_of_service",
});

policy_str!(ReassignPolicy, "reassign policy", {
    DoesNotTouchAvailability => "does_not_touch_availability",
    TransferAvailability => "transfer_availability",
});

policy_str!(AssignmentGuard, "assignment guard", {
    Unchecked => "unchecked",
    RequireReady => "require_ready",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_config_spellings() {
        assert_eq!(
            "preserve-out-of-service".parse::<CancelPolicy>(),
            Ok(CancelPolicy::PreserveOutOfService)
        );
        assert_eq!(
            " Transfer_Availability ".parse::<ReassignPolicy>(),
            Ok(ReassignPolicy::TransferAvailability)
        );
        assert_eq!(
            "require_ready".parse::<AssignmentGuard>(),
            Ok(AssignmentGuard::RequireReady)
        );
        assert!("sometimes".parse::<CancelPolicy>().is_err());
    }

    #[test]
    fn defaults_keep_historical_behavior() {
        assert_eq!(CancelPolicy::default(), CancelPolicy::AlwaysResetsAvailability);
        assert_eq!(
            ReassignPolicy::default(),
            ReassignPolicy::DoesNotTouchAvailability
        );
        assert_eq!(AssignmentGuard::default(), AssignmentGuard::Unchecked);
    }

    #[test]
    fn display_matches_parse() {
        for policy in [
            CancelPolicy::AlwaysResetsAvailability,
            CancelPolicy::PreserveOutOfService,
        ] {
            assert_eq!(policy.to_string().parse::<CancelPolicy>(), Ok(policy));
        }
    }
}
