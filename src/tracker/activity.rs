use std::{fmt::Display, str::FromStr};

use anyhow::anyhow;

/// Activities a session can be tagged with. [Activity::Unknown] is never offered for selection,
/// it's what a session gets when it was started without choosing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    EatingDrinking,
    Talking,
    Others,
    Unknown,
}

impl Activity {
    /// Activities in the order they are offered to the user.
    pub const SELECTABLE: [Activity; 3] = [
        Activity::EatingDrinking,
        Activity::Talking,
        Activity::Others,
    ];

    /// Label written into exports. Must never contain a comma, exports don't quote fields.
    pub fn label(&self) -> &'static str {
        match self {
            Activity::EatingDrinking => "Eating_Drinking",
            Activity::Talking => "Talking",
            Activity::Others => "Others",
            Activity::Unknown => "Unknown",
        }
    }

    /// Human readable name for menus.
    pub fn title(&self) -> &'static str {
        match self {
            Activity::EatingDrinking => "Eating/Drinking",
            Activity::Talking => "Talking",
            Activity::Others => "Others",
            Activity::Unknown => "Unknown",
        }
    }
}

impl Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Activity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        match value.as_str() {
            "1" | "eating_drinking" | "eating/drinking" | "eating" | "drinking" => {
                Ok(Activity::EatingDrinking)
            }
            "2" | "talking" | "talk" => Ok(Activity::Talking),
            "3" | "others" | "other" => Ok(Activity::Others),
            _ => Err(anyhow!(
                "Unknown activity {s:?}. Expected one of {}",
                Activity::SELECTABLE
                    .iter()
                    .map(Activity::label)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Activity;

    #[test]
    fn test_parse_labels_and_aliases() {
        assert_eq!("Eating_Drinking".parse::<Activity>().unwrap(), Activity::EatingDrinking);
        assert_eq!("eating".parse::<Activity>().unwrap(), Activity::EatingDrinking);
        assert_eq!(" TALKING ".parse::<Activity>().unwrap(), Activity::Talking);
        assert_eq!("3".parse::<Activity>().unwrap(), Activity::Others);
    }

    #[test]
    fn test_unknown_is_not_selectable() {
        assert!("unknown".parse::<Activity>().is_err());
        assert!("".parse::<Activity>().is_err());
        assert!(!Activity::SELECTABLE.contains(&Activity::Unknown));
    }

    #[test]
    fn test_labels_are_csv_safe() {
        for activity in Activity::SELECTABLE.iter().chain([&Activity::Unknown]) {
            assert!(!activity.label().contains(','));
            assert!(!activity.label().contains('\n'));
        }
    }
}
