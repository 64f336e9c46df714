//! Tagged extraction candidates.
//!
//! OCR payloads vary wildly: newer captures use a structured shape
//! (`detalhes_fiscais`, `emitente`), older ones are flat bags of guessed
//! keys. Both are normalized here into an ordered candidate list so the
//! rest of the system only ever asks `find(kind)`.

use serde::Serialize;
use serde_json::Value;

use crate::money;

/// The fields the review screen cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Total amount of the expense.
    Total,
    /// Issue date of the invoice/receipt.
    IssuedAt,
    /// Phone number detected on or alongside the document.
    Phone,
    /// Vendor / merchant name.
    Vendor,
    /// Vendor tax id (CNPJ/CPF).
    TaxId,
}

impl FieldKind {
    /// Key fragments that identify this field in loosely-keyed payloads.
    fn synonyms(&self) -> &'static [&'static str] {
        match self {
            FieldKind::Total => &["total", "amount", "valor", "value"],
            FieldKind::IssuedAt => &["date", "data", "emissao"],
            FieldKind::Phone => &["phone", "tel", "whatsapp"],
            FieldKind::Vendor => &["vendor", "merchant", "loja", "fornecedor", "nome_fantasia"],
            FieldKind::TaxId => &["cnpj", "cpf"],
        }
    }

    /// All kinds, in display order.
    pub fn all() -> &'static [FieldKind] {
        &[
            FieldKind::Total,
            FieldKind::IssuedAt,
            FieldKind::Phone,
            FieldKind::Vendor,
            FieldKind::TaxId,
        ]
    }
}

/// Extraction confidence reported by the capture pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Low,
}

/// One extracted value with its provenance kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub kind: FieldKind,
    pub confidence: Confidence,
    pub raw: Value,
}

/// Ordered extraction candidates for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    candidates: Vec<Candidate>,
}

impl Extraction {
    /// Build candidates from a raw OCR payload.
    ///
    /// Structured paths are read first, then a fallback scan over the top
    /// level and one nested level fills in kinds still missing. The scan is
    /// depth-limited on purpose; anything deeper has never carried signal.
    pub fn from_json(payload: &Value) -> Self {
        let confidence = payload_confidence(payload);
        let mut candidates = Vec::new();

        for (kind, path) in [
            (FieldKind::Total, ["detalhes_fiscais", "valor_total"]),
            (FieldKind::IssuedAt, ["detalhes_fiscais", "data_emissao"]),
            (FieldKind::Vendor, ["emitente", "razao_social"]),
            (FieldKind::TaxId, ["emitente", "cnpj_cpf"]),
        ] {
            if let Some(value) = payload.get(path[0]).and_then(|v| v.get(path[1])) {
                if is_scalar(value) {
                    candidates.push(Candidate {
                        kind,
                        confidence,
                        raw: value.clone(),
                    });
                }
            }
        }

        for &kind in FieldKind::all() {
            if candidates.iter().any(|c| c.kind == kind) {
                continue;
            }
            if let Some(value) = scan_for(payload, kind) {
                candidates.push(Candidate {
                    kind,
                    confidence,
                    raw: value.clone(),
                });
            }
        }

        Self { candidates }
    }

    /// First candidate of a kind.
    pub fn find(&self, kind: FieldKind) -> Option<&Value> {
        self.candidates
            .iter()
            .find(|c| c.kind == kind)
            .map(|c| &c.raw)
    }

    /// All candidates, in order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Whether the pipeline flagged this payload as low confidence.
    pub fn is_low_confidence(&self) -> bool {
        self.candidates
            .iter()
            .any(|c| c.confidence == Confidence::Low)
    }

    /// Human-readable value for a field.
    ///
    /// Totals are rendered as Brazilian currency when parseable (a raw
    /// `"150,00"` becomes `R$ 150,00`, never a bare string or a parse
    /// artifact); other kinds render scalars as plain text.
    pub fn display(&self, kind: FieldKind) -> Option<String> {
        let value = self.find(kind)?;

        if kind == FieldKind::Total {
            if let Some(centavos) = money::parse_brl_value(value) {
                return Some(money::format_brl(centavos));
            }
        }

        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Read `ai_metadata.confianca`; `BAIXA` marks the whole payload low.
fn payload_confidence(payload: &Value) -> Confidence {
    match payload
        .get("ai_metadata")
        .and_then(|m| m.get("confianca"))
        .and_then(Value::as_str)
    {
        Some("BAIXA") => Confidence::Low,
        _ => Confidence::High,
    }
}

fn is_scalar(value: &Value) -> bool {
    !(value.is_object() || value.is_array() || value.is_null())
}

/// Shallow scan, then one nested level: first scalar under a key that
/// contains one of the kind's synonyms wins.
fn scan_for(payload: &Value, kind: FieldKind) -> Option<&Value> {
    let map = payload.as_object()?;

    for (key, value) in map {
        if key_matches(key, kind) && is_scalar(value) {
            return Some(value);
        }
    }

    for value in map.values() {
        if let Some(nested) = value.as_object() {
            for (key, value) in nested {
                if key_matches(key, kind) && is_scalar(value) {
                    return Some(value);
                }
            }
        }
    }

    None
}

fn key_matches(key: &str, kind: FieldKind) -> bool {
    let key = key.to_lowercase();
    kind.synonyms().iter().any(|s| key.contains(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_payload() {
        let payload = json!({
            "emitente": { "razao_social": "Posto Shell", "cnpj_cpf": "12.345.678/0001-00" },
            "detalhes_fiscais": { "valor_total": "1.234,56", "data_emissao": "2026-08-01" }
        });
        let extraction = Extraction::from_json(&payload);

        assert_eq!(
            extraction.find(FieldKind::Vendor),
            Some(&json!("Posto Shell"))
        );
        assert_eq!(
            extraction.display(FieldKind::Total).as_deref(),
            Some("R$ 1.234,56")
        );
        assert_eq!(
            extraction.display(FieldKind::IssuedAt).as_deref(),
            Some("2026-08-01")
        );
        assert!(!extraction.is_low_confidence());
    }

    #[test]
    fn test_flat_payload_scan() {
        let payload = json!({
            "Valor Total": "150,00",
            "telefone": "5511999990001",
            "loja": "Mercado União"
        });
        let extraction = Extraction::from_json(&payload);

        assert_eq!(
            extraction.display(FieldKind::Total).as_deref(),
            Some("R$ 150,00")
        );
        assert_eq!(
            extraction.display(FieldKind::Phone).as_deref(),
            Some("5511999990001")
        );
        assert_eq!(
            extraction.display(FieldKind::Vendor).as_deref(),
            Some("Mercado União")
        );
    }

    #[test]
    fn test_nested_scan_one_level_only() {
        let payload = json!({
            "header": { "data": "2026-08-01" },
            "deep": { "deeper": { "total": "99,00" } }
        });
        let extraction = Extraction::from_json(&payload);

        assert_eq!(
            extraction.display(FieldKind::IssuedAt).as_deref(),
            Some("2026-08-01")
        );
        // Two levels down is out of the scan's reach.
        assert_eq!(extraction.find(FieldKind::Total), None);
    }

    #[test]
    fn test_scalar_preferred_over_container() {
        let payload = json!({
            "total": { "bruto": "200,00" },
            "valor": "150,00"
        });
        let extraction = Extraction::from_json(&payload);

        // The shallow scalar wins over the same-named object.
        assert_eq!(extraction.find(FieldKind::Total), Some(&json!("150,00")));
    }

    #[test]
    fn test_low_confidence_flag() {
        let payload = json!({
            "total": "150,00",
            "ai_metadata": { "confianca": "BAIXA" }
        });
        let extraction = Extraction::from_json(&payload);
        assert!(extraction.is_low_confidence());
    }

    #[test]
    fn test_unparseable_total_falls_back_to_raw() {
        let payload = json!({ "total": "ilegível" });
        let extraction = Extraction::from_json(&payload);
        assert_eq!(
            extraction.display(FieldKind::Total).as_deref(),
            Some("ilegível")
        );
    }

    #[test]
    fn test_empty_payload() {
        let extraction = Extraction::from_json(&json!({}));
        assert!(extraction.candidates().is_empty());
        assert_eq!(extraction.find(FieldKind::Total), None);
        assert_eq!(extraction.display(FieldKind::Total), None);
    }
}
