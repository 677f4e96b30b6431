//! Localized labels for verdicts and compliance matrix headers.

use crate::domain::Language;
use crate::item::Verdict;

/// Column headers of the exported compliance matrix, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixHeaders {
    pub requirement: &'static str,
    pub verdict: &'static str,
    pub reference: &'static str,
    pub description: &'static str,
}

pub fn verdict_label(verdict: Verdict, lang: Language) -> &'static str {
    match (lang, verdict) {
        (Language::Pt, Verdict::Yes) => "Sim",
        (Language::Pt, Verdict::No) => "Não",
        (Language::Pt, Verdict::Partial) => "Parcial",
        (Language::Pt, Verdict::Indeterminate) => "Indeterminado",
        (Language::En, Verdict::Yes) => "Yes",
        (Language::En, Verdict::No) => "No",
        (Language::En, Verdict::Partial) => "Partial",
        (Language::En, Verdict::Indeterminate) => "Indeterminate",
        (Language::Es, Verdict::Yes) => "Sí",
        (Language::Es, Verdict::No) => "No",
        (Language::Es, Verdict::Partial) => "Parcial",
        (Language::Es, Verdict::Indeterminate) => "Indeterminado",
    }
}

pub fn matrix_headers(lang: Language) -> MatrixHeaders {
    match lang {
        Language::Pt => MatrixHeaders {
            requirement: "Requisito",
            verdict: "Atende?",
            reference: "Link de Referência",
            description: "Descrição Técnica",
        },
        Language::En => MatrixHeaders {
            requirement: "Requirement",
            verdict: "Compliant?",
            reference: "Reference Link",
            description: "Technical Description",
        },
        Language::Es => MatrixHeaders {
            requirement: "Requisito",
            verdict: "¿Cumple?",
            reference: "Enlace de Referencia",
            description: "Descripción Técnica",
        },
    }
}

/// Title of the compliance matrix sheet/table.
pub fn matrix_title(lang: Language) -> &'static str {
    match lang {
        Language::Pt => "Matriz de Conformidade",
        Language::En => "Compliance Matrix",
        Language::Es => "Matriz de Cumplimiento",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portuguese_labels_match_grammar_tokens() {
        assert_eq!(verdict_label(Verdict::Yes, Language::Pt), "Sim");
        assert_eq!(verdict_label(Verdict::No, Language::Pt), "Não");
        assert_eq!(verdict_label(Verdict::Partial, Language::Pt), "Parcial");
    }

    #[test]
    fn headers_differ_per_language() {
        assert_ne!(matrix_headers(Language::Pt), matrix_headers(Language::En));
        assert_eq!(matrix_headers(Language::En).verdict, "Compliant?");
    }
}
