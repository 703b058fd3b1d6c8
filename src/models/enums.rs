use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(ExtractionStatus {
    Ok => "ok",
    Partial => "partial",
    Error => "error",
});

// Stored as the single-letter tag found in the source document: (B), (S), (H).
str_enum!(Classification {
    Basis => "B",
    Standard => "S",
    High => "H",
});

impl Classification {
    /// Human-readable tier name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Basis => "Basis",
            Self::Standard => "Standard",
            Self::High => "Hoch",
        }
    }
}

str_enum!(JobStatus {
    Queued => "queued",
    Running => "running",
    Completed => "completed",
    Failed => "failed",
    Cancelled => "cancelled",
});

impl JobStatus {
    /// Terminal states: no further transitions allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}
