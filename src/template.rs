//! Receiver command template
use std::{fs, path::Path};

use log::{debug, info};

use crate::{
    averager::SurveyResult,
    constants::{DEFAULT_SENTINEL, HEIGHT_SCALING, LAT_LON_SCALING},
    error::Error,
    utils::zero_fill,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of placeholders a template must carry:
/// latitude, longitude then height.
const PLACEHOLDERS: usize = 3;

fn default_sentinel() -> String {
    DEFAULT_SENTINEL.to_string()
}

const fn default_lat_lon_width() -> usize {
    10
}

const fn default_height_width() -> usize {
    4
}

/// Describes how the surveyed position is laid out in the template.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TemplateFormat {
    /// Placeholder string, replaced verbatim
    #[cfg_attr(feature = "serde", serde(default = "default_sentinel"))]
    pub sentinel: String,
    /// Latitude field width (1E-7 degrees)
    #[cfg_attr(feature = "serde", serde(default = "default_lat_lon_width"))]
    pub latitude_width: usize,
    /// Longitude field width (1E-7 degrees)
    #[cfg_attr(feature = "serde", serde(default = "default_lat_lon_width"))]
    pub longitude_width: usize,
    /// Height field width (centimeters)
    #[cfg_attr(feature = "serde", serde(default = "default_height_width"))]
    pub height_width: usize,
}

impl Default for TemplateFormat {
    fn default() -> Self {
        Self {
            sentinel: default_sentinel(),
            latitude_width: default_lat_lon_width(),
            longitude_width: default_lat_lon_width(),
            height_width: default_height_width(),
        }
    }
}

impl TemplateFormat {
    /// Renders the three fields, in template order
    pub fn fields(&self, result: &SurveyResult) -> [String; PLACEHOLDERS] {
        [
            zero_fill(
                (result.latitude_ddeg * LAT_LON_SCALING).round() as i64,
                self.latitude_width,
            ),
            zero_fill(
                (result.longitude_ddeg * LAT_LON_SCALING).round() as i64,
                self.longitude_width,
            ),
            zero_fill(
                (result.height_m * HEIGHT_SCALING).round() as i64,
                self.height_width,
            ),
        ]
    }
}

/// [CommandTemplate] is a receiver command payload with (at least) three
/// sentinel placeholders. The first three receive latitude, longitude
/// and height, in that order. Any following occurrence is left untouched.
#[derive(Debug, Clone)]
pub struct CommandTemplate {
    content: String,
    format: TemplateFormat,
    /// Byte offset of each placeholder in the original content
    placeholders: Vec<usize>,
}

impl CommandTemplate {
    /// Builds a [CommandTemplate], verifying it carries enough placeholders.
    pub fn new(content: String, format: &TemplateFormat) -> Result<Self, Error> {
        if format.sentinel.is_empty() {
            return Err(Error::TemplateMalformed { found: 0 });
        }

        let placeholders = content
            .match_indices(format.sentinel.as_str())
            .map(|(offset, _)| offset)
            .collect::<Vec<_>>();

        if placeholders.len() < PLACEHOLDERS {
            return Err(Error::TemplateMalformed {
                found: placeholders.len(),
            });
        }

        debug!("command template: {} placeholders", placeholders.len());

        Ok(Self {
            content,
            format: format.clone(),
            placeholders,
        })
    }

    /// Loads a [CommandTemplate] from a local file
    pub fn from_file(path: &Path, format: &TemplateFormat) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        Self::new(content, format)
    }

    /// Number of placeholders found in the template
    pub fn placeholders(&self) -> usize {
        self.placeholders.len()
    }

    /// Substitutes the [SurveyResult] into the template. Placeholders are
    /// located in the original template, so a substituted value that
    /// happens to look like the sentinel is never substituted again.
    pub fn render(&self, result: &SurveyResult) -> String {
        let fields = self.format.fields(result);
        let sentinel_len = self.format.sentinel.len();

        let mut payload = String::with_capacity(self.content.len() + 8);
        let mut cursor = 0;

        for (offset, field) in self.placeholders.iter().zip(fields.iter()) {
            payload.push_str(&self.content[cursor..*offset]);
            payload.push_str(field);
            cursor = offset + sentinel_len;
        }

        payload.push_str(&self.content[cursor..]);
        payload
    }

    /// Renders and writes the derived payload. The payload is written
    /// to a temporary file first, so the destination either holds the
    /// complete payload or is left as it was.
    pub fn render_to_file(&self, result: &SurveyResult, path: &Path) -> Result<String, Error> {
        let payload = self.render(result);

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");

        if let Err(e) = fs::write(&tmp, payload.as_bytes()).and_then(|_| fs::rename(&tmp, path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        info!("derived command file {} written", path.display());
        Ok(payload)
    }
}
