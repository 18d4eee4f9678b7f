//! Data structures describing the input of a report.
//!
//! The types in this module form a serialization-friendly model of what ends up on the page.
//! They intentionally avoid referencing the rendering crate so that requests can be read from
//! JSON, persisted, or built by other services without pulling in `genpdf`.
//!
//! Two layers live here: the generic [`ReportRequest`] consumed by the composer, and the
//! [`Patrimonio`]/[`Arquivo`] snapshot types that mirror the database rows of the inventory
//! tracker and convert into a request.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Title used for asset reports when the caller does not provide one.
pub const DEFAULT_TITLE: &str = "Relatório de Patrimônio";

/// Placeholder shown for absent values.
pub const PLACEHOLDER: &str = "-";

/// Display value of a single record field.
///
/// Deserializes from plain JSON scalars: strings, booleans, numbers and `null`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// No value; rendered as [`PLACEHOLDER`].
    #[default]
    Null,
    /// Yes/no flag; rendered as `Sim`/`Não`.
    Bool(bool),
    /// Numeric value; integral numbers are rendered without a fractional part.
    Number(f64),
    /// Free text.
    Text(String),
}

impl FieldValue {
    /// Returns `true` when the value renders as the placeholder.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// Returns the value, or `fallback` when this one is blank.
    pub fn or(self, fallback: FieldValue) -> FieldValue {
        if self.is_blank() {
            fallback
        } else {
            self
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str(PLACEHOLDER),
            Self::Bool(true) => f.write_str("Sim"),
            Self::Bool(false) => f.write_str("Não"),
            Self::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(text) if text.trim().is_empty() => f.write_str(PLACEHOLDER),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// A labelled value of the record, in display order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordField {
    pub label: String,
    #[serde(default)]
    pub value: FieldValue,
}

impl RecordField {
    /// Creates a field from a label and anything convertible into a [`FieldValue`].
    pub fn new(label: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A file attached to the record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

impl Attachment {
    /// Creates an attachment with the given URL and MIME type.
    pub fn new(url: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            url: url.into(),
            mime_type: mime_type.into(),
            size_bytes: None,
        }
    }

    /// Sets the file name and returns the updated attachment.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Whether the attachment belongs in the image gallery.
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image")
    }
}

/// Everything the composer needs to render one report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub record: Vec<RecordField>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub report_url: Option<String>,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_owned()
}

impl ReportRequest {
    /// Creates an empty request with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            record: Vec::new(),
            attachments: Vec::new(),
            report_url: None,
        }
    }

    /// Builds the request for an asset snapshot and its files.
    pub fn for_patrimonio(
        patrimonio: &Patrimonio,
        arquivos: &[Arquivo],
        report_url: impl Into<Option<String>>,
    ) -> Self {
        Self::new(DEFAULT_TITLE)
            .with_fields(patrimonio.record())
            .with_attachments(arquivos.iter().cloned().map(Attachment::from))
            .with_report_url(report_url)
    }

    /// Appends a field and returns the updated request.
    pub fn with_field(mut self, label: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.record.push(RecordField::new(label, value));
        self
    }

    /// Extends the record with multiple fields and returns the updated request.
    pub fn with_fields<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = RecordField>,
    {
        self.record.extend(fields);
        self
    }

    /// Appends an attachment and returns the updated request.
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Extends the attachment list and returns the updated request.
    pub fn with_attachments<I>(mut self, attachments: I) -> Self
    where
        I: IntoIterator<Item = Attachment>,
    {
        self.attachments.extend(attachments);
        self
    }

    /// Sets the link embedded as a QR code and returns the updated request.
    pub fn with_report_url(mut self, report_url: impl Into<Option<String>>) -> Self {
        self.report_url = report_url.into().filter(|url| !url.trim().is_empty());
        self
    }

    /// URLs of the image attachments, in their original order.
    pub fn image_urls(&self) -> Vec<&str> {
        self.attachments
            .iter()
            .filter(|attachment| attachment.is_image())
            .map(|attachment| attachment.url.as_str())
            .collect()
    }
}

/// Snapshot of a `TB_PATRIMONIO` row joined with its unit descriptions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Patrimonio {
    #[serde(default)]
    pub id_patrimonio: Option<u64>,
    #[serde(default)]
    pub id_cpr: Option<i64>,
    #[serde(default)]
    pub ds_cpr: Option<String>,
    #[serde(default)]
    pub id_bpm: Option<i64>,
    #[serde(default)]
    pub ds_bpm: Option<String>,
    #[serde(default)]
    pub id_pcs: Option<i64>,
    #[serde(default)]
    pub ds_pcs: Option<String>,
    #[serde(default)]
    pub nu_tombamento_modulo: FieldValue,
    #[serde(default)]
    pub nu_tombamento_torre: FieldValue,
    #[serde(default)]
    pub tx_localizacao: Option<String>,
    #[serde(default)]
    pub tx_endereco: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub st_base_localizado: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub st_modulo_localizado: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub st_torre_localizado: bool,
    #[serde(default)]
    pub tx_observacao: Option<String>,
}

impl Patrimonio {
    /// Returns the report fields in display order.
    ///
    /// Unit names fall back to their numeric identifiers when the description is missing.
    pub fn record(&self) -> Vec<RecordField> {
        vec![
            RecordField::new("CPR:", unit_label(&self.ds_cpr, self.id_cpr)),
            RecordField::new("BPM:", unit_label(&self.ds_bpm, self.id_bpm)),
            RecordField::new("PCS:", unit_label(&self.ds_pcs, self.id_pcs)),
            RecordField::new("N. Tombamento Módulo:", self.nu_tombamento_modulo.clone()),
            RecordField::new("N. Tombamento Torre:", self.nu_tombamento_torre.clone()),
            RecordField::new("Localização (URL):", self.tx_localizacao.clone()),
            RecordField::new("Endereço:", self.tx_endereco.clone()),
            RecordField::new("Base localizada:", self.st_base_localizado),
            RecordField::new("Módulo localizado:", self.st_modulo_localizado),
            RecordField::new("Torre localizada:", self.st_torre_localizado),
            RecordField::new("Observações:", self.tx_observacao.clone()),
        ]
    }
}

fn unit_label(description: &Option<String>, id: Option<i64>) -> FieldValue {
    FieldValue::from(description.clone()).or(FieldValue::from(id.map(|id| id.to_string())))
}

/// Accepts MySQL `TINYINT` flags as either numbers or booleans.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(i64),
        Null,
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(flag) => flag,
        Flag::Number(n) => n != 0,
        Flag::Null => false,
    })
}

/// Snapshot of a `TB_ARQUIVO` row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Arquivo {
    #[serde(default)]
    pub id_arquivo: Option<u64>,
    #[serde(default)]
    pub nm_arquivo: String,
    pub url_arquivo_bucket: String,
    #[serde(default)]
    pub tp_arquivo: Option<String>,
    #[serde(default)]
    pub tam_arquivo: Option<u64>,
}

impl From<Arquivo> for Attachment {
    fn from(arquivo: Arquivo) -> Self {
        Self {
            name: arquivo.nm_arquivo,
            url: arquivo.url_arquivo_bucket,
            mime_type: arquivo.tp_arquivo.unwrap_or_default(),
            size_bytes: arquivo.tam_arquivo,
        }
    }
}

/// An asset together with its files, as returned by the asset lookup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatrimonioSnapshot {
    #[serde(flatten)]
    pub patrimonio: Patrimonio,
    #[serde(default)]
    pub arquivos: Vec<Arquivo>,
}

#[cfg(test)]
mod tests {
    use super::{Arquivo, Attachment, FieldValue, Patrimonio, PatrimonioSnapshot, ReportRequest};

    #[test]
    fn field_values_render_for_display() {
        assert_eq!(FieldValue::Null.to_string(), "-");
        assert_eq!(FieldValue::Bool(true).to_string(), "Sim");
        assert_eq!(FieldValue::Bool(false).to_string(), "Não");
        assert_eq!(FieldValue::Number(42.0).to_string(), "42");
        assert_eq!(FieldValue::Number(1.5).to_string(), "1.5");
        assert_eq!(FieldValue::from("  ").to_string(), "-");
        assert_eq!(FieldValue::from(None::<String>).to_string(), "-");
    }

    #[test]
    fn field_values_deserialize_from_json_scalars() {
        let values: Vec<FieldValue> =
            serde_json::from_str(r#"[null, true, 7, "texto"]"#).expect("parse values");
        assert_eq!(
            values,
            vec![
                FieldValue::Null,
                FieldValue::Bool(true),
                FieldValue::Number(7.0),
                FieldValue::Text("texto".to_owned()),
            ]
        );
    }

    #[test]
    fn image_urls_keep_order_and_skip_other_types() {
        let request = ReportRequest::new("t")
            .with_attachment(Attachment::new("https://a/1.jpg", "image/jpeg"))
            .with_attachment(Attachment::new("https://a/doc.pdf", "application/pdf"))
            .with_attachment(Attachment::new("https://a/2.png", "image/png"));

        assert_eq!(
            request.image_urls(),
            vec!["https://a/1.jpg", "https://a/2.png"]
        );
    }

    #[test]
    fn blank_report_url_is_dropped() {
        let request = ReportRequest::new("t").with_report_url(Some("  ".to_owned()));
        assert!(request.report_url.is_none());
    }

    #[test]
    fn patrimonio_record_uses_latest_field_set() {
        let patrimonio = Patrimonio {
            id_cpr: Some(1),
            ds_cpr: Some("1º CPR".to_owned()),
            id_bpm: Some(5),
            id_pcs: Some(12),
            ds_pcs: Some(String::new()),
            tx_endereco: Some("QNM 10".to_owned()),
            st_base_localizado: true,
            ..Patrimonio::default()
        };

        let record = patrimonio.record();
        let labels: Vec<_> = record.iter().map(|field| field.label.as_str()).collect();
        assert_eq!(labels.len(), 11);
        assert_eq!(labels[0], "CPR:");
        assert_eq!(labels[7], "Base localizada:");
        assert_eq!(record[0].value.to_string(), "1º CPR");
        assert_eq!(record[1].value.to_string(), "5");
        assert_eq!(record[2].value.to_string(), "12");
        assert_eq!(record[3].value.to_string(), "-");
        assert_eq!(record[6].value.to_string(), "QNM 10");
        assert_eq!(record[7].value.to_string(), "Sim");
        assert_eq!(record[8].value.to_string(), "Não");
    }

    #[test]
    fn snapshot_parses_database_rows() {
        let json = r#"{
            "ID_PATRIMONIO": 3,
            "ID_CPR": 1, "DS_CPR": "1º CPR",
            "NU_TOMBAMENTO_MODULO": 123456,
            "ST_MODULO_LOCALIZADO": 1,
            "ST_TORRE_LOCALIZADO": null,
            "arquivos": [
                {
                    "URL_ARQUIVO_BUCKET": "https://b/x.jpg",
                    "TP_ARQUIVO": "image/jpeg",
                    "NM_ARQUIVO": "x.jpg"
                }
            ]
        }"#;
        let snapshot: PatrimonioSnapshot = serde_json::from_str(json).expect("parse snapshot");

        assert_eq!(snapshot.patrimonio.id_patrimonio, Some(3));
        assert!(snapshot.patrimonio.st_modulo_localizado);
        assert!(!snapshot.patrimonio.st_torre_localizado);
        assert_eq!(snapshot.patrimonio.nu_tombamento_modulo.to_string(), "123456");

        let request =
            ReportRequest::for_patrimonio(&snapshot.patrimonio, &snapshot.arquivos, None);
        assert_eq!(request.image_urls(), vec!["https://b/x.jpg"]);
    }

    #[test]
    fn arquivo_without_type_is_not_an_image() {
        let attachment = Attachment::from(Arquivo {
            url_arquivo_bucket: "https://b/x".to_owned(),
            ..Arquivo::default()
        });
        assert!(!attachment.is_image());
    }
}
