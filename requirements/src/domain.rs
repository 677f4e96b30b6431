//! Security domain catalog and the vendor context a batch run is evaluated against.
//!
//! Every domain carries a fixed, ordered vendor list. A [`VendorContext`] can
//! only be built from a vendor that belongs to its domain, so downstream code
//! never has to re-validate the pairing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while resolving catalog entries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown security domain '{0}'")]
    UnknownDomain(String),

    #[error("vendor '{vendor}' is not listed for domain '{domain}'")]
    VendorNotInDomain { domain: SecurityDomain, vendor: String },

    #[error("unknown language '{0}' (expected pt, en or es)")]
    UnknownLanguage(String),
}

/// Fixed security domains a requirement list can be validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityDomain {
    /// Network Security (NGFW)
    NetworkSecurity,
    /// Endpoint Protection (EPP/EDR)
    EndpointProtection,
    /// SSE / SASE
    SecureAccess,
    EmailSecurity,
    /// Cloud Security (CNAPP)
    CloudSecurity,
    /// Web Application Firewall
    Waf,
    /// AI Security / Protection
    AiSecurity,
}

impl SecurityDomain {
    pub const ALL: [SecurityDomain; 7] = [
        Self::NetworkSecurity,
        Self::EndpointProtection,
        Self::SecureAccess,
        Self::EmailSecurity,
        Self::CloudSecurity,
        Self::Waf,
        Self::AiSecurity,
    ];

    /// Short command-line slug (`ngfw`, `edr`, ...).
    pub fn slug(self) -> &'static str {
        match self {
            Self::NetworkSecurity => "ngfw",
            Self::EndpointProtection => "edr",
            Self::SecureAccess => "sase",
            Self::EmailSecurity => "email",
            Self::CloudSecurity => "cnapp",
            Self::Waf => "waf",
            Self::AiSecurity => "ai",
        }
    }

    /// Human-readable domain label used in prompts and reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::NetworkSecurity => "Network Security (NGFW)",
            Self::EndpointProtection => "Endpoint Protection (EPP/EDR)",
            Self::SecureAccess => "SSE / SASE",
            Self::EmailSecurity => "Email Security",
            Self::CloudSecurity => "Cloud Security (CNAPP)",
            Self::Waf => "WAF (Web Application Firewall)",
            Self::AiSecurity => "AI Security / Protection",
        }
    }

    /// Ordered vendor list for this domain. The first entry is the default.
    pub fn vendors(self) -> &'static [&'static str] {
        match self {
            Self::NetworkSecurity => &[
                "Palo Alto Networks",
                "Fortinet",
                "Check Point",
                "Cisco",
                "Juniper Networks",
                "Sophos",
            ],
            Self::EndpointProtection => &[
                "CrowdStrike",
                "SentinelOne",
                "Microsoft Defender",
                "Trend Micro",
                "Sophos",
                "Broadcom (Symantec)",
            ],
            Self::SecureAccess => &[
                "Zscaler",
                "Netskope",
                "Check Point (Harmony SASE)",
                "Palo Alto Networks (Prisma Access)",
                "Cato Networks",
                "Cloudflare",
            ],
            Self::EmailSecurity => &[
                "Proofpoint",
                "Mimecast",
                "Microsoft",
                "Check Point (Harmony Email/Avanan)",
                "Barracuda",
            ],
            Self::CloudSecurity => &[
                "Wiz",
                "Orca Security",
                "Palo Alto Networks (Prisma Cloud)",
                "Check Point (CloudGuard)",
                "Sysdig",
                "Lacework",
            ],
            Self::Waf => &[
                "Akamai",
                "Cloudflare",
                "Imperva",
                "F5",
                "Check Point (CloudGuard WAF)",
                "Fortinet",
                "AWS WAF",
            ],
            Self::AiSecurity => &[
                "Palo Alto Networks (Secure AI)",
                "Check Point",
                "Microsoft (Security Copilot)",
                "HiddenLayer",
                "Protect AI",
            ],
        }
    }

    /// Case-insensitive lookup of a vendor name in this domain's list,
    /// returning the canonical spelling.
    pub fn find_vendor(self, name: &str) -> Option<&'static str> {
        let wanted = name.trim();
        self.vendors()
            .iter()
            .copied()
            .find(|v| v.eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for SecurityDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SecurityDomain {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.slug().eq_ignore_ascii_case(wanted) || d.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CatalogError::UnknownDomain(wanted.to_string()))
    }
}

/// Domain plus vendor pairing the analysis is performed for.
///
/// Construction validates that the vendor belongs to the domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorContext {
    domain: SecurityDomain,
    vendor: String,
}

impl VendorContext {
    pub fn new(domain: SecurityDomain, vendor: &str) -> Result<Self, CatalogError> {
        let canonical = domain
            .find_vendor(vendor)
            .ok_or_else(|| CatalogError::VendorNotInDomain {
                domain,
                vendor: vendor.trim().to_string(),
            })?;
        Ok(Self {
            domain,
            vendor: canonical.to_string(),
        })
    }

    /// The domain's first listed vendor.
    pub fn default_for(domain: SecurityDomain) -> Self {
        Self {
            domain,
            vendor: domain.vendors()[0].to_string(),
        }
    }

    pub fn domain(&self) -> SecurityDomain {
        self.domain
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }
}

impl Default for VendorContext {
    fn default() -> Self {
        Self::default_for(SecurityDomain::NetworkSecurity)
    }
}

/// Response language requested from the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Pt,
    En,
    Es,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Self::Pt => "pt",
            Self::En => "en",
            Self::Es => "es",
        }
    }

    /// Upper-case language name embedded in the prompt.
    pub fn prompt_name(self) -> &'static str {
        match self {
            Self::Pt => "PORTUGUESE",
            Self::En => "ENGLISH",
            Self::Es => "SPANISH",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pt" | "pt-br" | "portuguese" => Ok(Self::Pt),
            "en" | "english" => Ok(Self::En),
            "es" | "spanish" => Ok(Self::Es),
            other => Err(CatalogError::UnknownLanguage(other.to_string())),
        }
    }
}
