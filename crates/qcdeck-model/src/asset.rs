use std::fmt::{Display, Formatter};

pub const NAME_SEPARATOR: char = '_';
pub const RAW_NAME_PARTS: usize = 4;
pub const DERIVED_NAME_PARTS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NameError {
    Empty,
    MalformedName { part_count: usize },
}

impl Display for NameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "asset name must not be empty"),
            Self::MalformedName { part_count } => write!(
                f,
                "asset name must have {RAW_NAME_PARTS} (raw) or {DERIVED_NAME_PARTS} (derived) \
                 underscore-separated parts, got {part_count}"
            ),
        }
    }
}

impl std::error::Error for NameError {}

/// Processing-stage suffix on a derived asset name: the stage label plus the
/// date/time the stage ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedStage {
    pub stage: String,
    pub date: String,
    pub time: String,
}

/// Parsed structured asset name.
///
/// Raw: `<modality>_<subject_id>_<date>_<time>`.
/// Derived: the raw prefix plus `_<stage>_<date2>_<time2>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetName {
    pub modality: String,
    pub subject_id: String,
    pub acquisition_date: String,
    pub acquisition_time: String,
    pub derived: Option<DerivedStage>,
}

impl AssetName {
    pub fn parse(input: &str) -> Result<Self, NameError> {
        if input.is_empty() {
            return Err(NameError::Empty);
        }
        let parts: Vec<&str> = input.split(NAME_SEPARATOR).collect();
        match parts.len() {
            RAW_NAME_PARTS => Ok(Self {
                modality: parts[0].to_string(),
                subject_id: parts[1].to_string(),
                acquisition_date: parts[2].to_string(),
                acquisition_time: parts[3].to_string(),
                derived: None,
            }),
            DERIVED_NAME_PARTS => Ok(Self {
                modality: parts[0].to_string(),
                subject_id: parts[1].to_string(),
                acquisition_date: parts[2].to_string(),
                acquisition_time: parts[3].to_string(),
                derived: Some(DerivedStage {
                    stage: parts[4].to_string(),
                    date: parts[5].to_string(),
                    time: parts[6].to_string(),
                }),
            }),
            part_count => Err(NameError::MalformedName { part_count }),
        }
    }

    #[must_use]
    pub fn is_raw(&self) -> bool {
        self.derived.is_none()
    }

    /// Raw-asset-name prefix shared by the asset and all of its
    /// derivatives. For a raw asset this is the full name.
    #[must_use]
    pub fn lineage_key(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.modality, self.subject_id, self.acquisition_date, self.acquisition_time
        )
    }

    /// The date/time pair this record's own timestamp comes from: the
    /// acquisition moment for a raw asset, the stage moment for a derived
    /// one.
    #[must_use]
    pub fn event_date_time(&self) -> (&str, &str) {
        match &self.derived {
            Some(stage) => (&stage.date, &stage.time),
            None => (&self.acquisition_date, &self.acquisition_time),
        }
    }
}

impl Display for AssetName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.modality, self.subject_id, self.acquisition_date, self.acquisition_time
        )?;
        if let Some(stage) = &self.derived {
            write!(f, "_{}_{}_{}", stage.stage, stage.date, stage.time)?;
        }
        Ok(())
    }
}

/// First-4-parts prefix for any name that has at least 4 parts, regardless
/// of whether the full name is well formed. Used to bucket malformed
/// records into a lineage group when the prefix is still recoverable.
#[must_use]
pub fn lineage_key_lenient(name: &str) -> Option<String> {
    let parts: Vec<&str> = name.split(NAME_SEPARATOR).collect();
    if parts.len() >= RAW_NAME_PARTS {
        Some(parts[..RAW_NAME_PARTS].join("_"))
    } else {
        None
    }
}
