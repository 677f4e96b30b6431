//! Prompt construction for requirement analysis.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever the template changes so a
//! logged response can be traced back to the prompt that produced it.
//!
//! The builder is a pure function of (requirement, vendor context, language,
//! locked model). Vendor-specific documentation guidance comes from an
//! ordered list of [`DeepSearchRule`]s, first match wins, with a generic
//! fallback when no rule matches.

use requirements::{Language, VendorContext};

/// Prompt version. Bump on any template change.
pub const PROMPT_VERSION: &str = "1.3.0";

/// Label lines of the reply grammar. The parser depends on these spellings.
pub const LABEL_VERDICT: &str = "Atende:";
pub const LABEL_MODEL: &str = "Modelo:";
pub const LABEL_LINK: &str = "Link de referencia:";
pub const LABEL_DESCRIPTION: &str = "Descricao:";

const GENERIC_DEEP_SEARCH: &str = "\
   - AVOID the vendor's main marketing pages (the bare .com/ home or product pages).
   - PREFER technical documentation subdomains (docs.*, support.*, kb.*, help.*).";

/// Vendor-name patterns mapped to documentation-sourcing guidance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepSearchRule {
    /// Lower-case substrings; any match selects this rule.
    patterns: Vec<String>,
    instruction: String,
}

impl DeepSearchRule {
    pub fn new(patterns: &[&str], instruction: impl Into<String>) -> Self {
        Self {
            patterns: patterns.iter().map(|p| p.to_lowercase()).collect(),
            instruction: instruction.into(),
        }
    }

    pub fn matches(&self, vendor: &str) -> bool {
        let vendor = vendor.to_lowercase();
        self.patterns.iter().any(|p| vendor.contains(p.as_str()))
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }
}

/// Built-in rules, in priority order.
pub fn default_rules() -> Vec<DeepSearchRule> {
    vec![
        DeepSearchRule::new(
            &["check point", "cloudguard", "harmony"],
            "\
   - TOP PRIORITY domains: 'sc1.checkpoint.com', 'supportcenter.checkpoint.com', \
'docs.checkpoint.com', 'research.checkpoint.com'.
   - FORBIDDEN: 'www.checkpoint.com/products/' and 'www.checkpoint.com/quantum/'.
   - Search for terms such as 'SK', 'Admin Guide', 'Release Notes', 'Datasheet'.",
        ),
        DeepSearchRule::new(
            &["palo alto", "prisma"],
            "\
   - TOP PRIORITY domains: 'docs.paloaltonetworks.com', 'knowledgebase.paloaltonetworks.com'.
   - FORBIDDEN: marketing landing pages.",
        ),
        DeepSearchRule::new(
            &["fortinet", "fortigate"],
            "   - TOP PRIORITY domains: 'docs.fortinet.com', 'kb.fortinet.com', 'handbook.fortinet.com'.",
        ),
        DeepSearchRule::new(
            &["cisco"],
            "   - TOP PRIORITY paths: 'cisco.com/c/en/us/td/docs/', 'cisco.com/c/en/us/support/'.",
        ),
    ]
}

/// Renders the instruction text sent to the backend for one requirement.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    rules: Vec<DeepSearchRule>,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    /// Use a custom ordered rule list (first match wins).
    pub fn with_rules(rules: Vec<DeepSearchRule>) -> Self {
        Self { rules }
    }

    /// Documentation guidance for `vendor`, or the generic fallback.
    pub fn deep_search_instruction(&self, vendor: &str) -> &str {
        self.rules
            .iter()
            .find(|r| r.matches(vendor))
            .map(DeepSearchRule::instruction)
            .unwrap_or(GENERIC_DEEP_SEARCH)
    }

    fn hardware_instruction(locked_model: Option<&str>) -> String {
        match locked_model {
            Some(model) => format!(
                "\
2. HARDWARE / SIZING (LOCKED):
   - The customer has already chosen the model \"{model}\".
   - Validate the requirement ONLY against the capabilities of this exact model.
   - If this model cannot meet the requirement, answer \"Não\"."
            ),
            None => "\
2. HARDWARE / SIZING:
   - If the requirement implies throughput, port count or capacity: CHOOSE EXACTLY ONE (1) MODEL.
   - Pick the best-fit model that meets it with headroom. Do not list whole product families.
   - Correct example: \"Model Quantum 6600 (3.7 Gbps Threat Prevention, 2x 10G SFP+).\""
                .to_string(),
        }
    }

    pub fn build(
        &self,
        requirement: &str,
        context: &VendorContext,
        lang: Language,
        locked_model: Option<&str>,
    ) -> String {
        let vendor = context.vendor();
        let domain = context.domain().label();
        let hardware = Self::hardware_instruction(locked_model);
        let deep_search = self.deep_search_instruction(vendor);
        let language = lang.prompt_name();

        format!(
            "\
Act as a Senior Pre-Sales Systems Engineer specialized in {vendor} ({domain}).

GOAL:
Technically validate whether the {vendor} solution meets the requirement below, \
and provide specific technical proof.

INPUT REQUIREMENT:
\"{requirement}\"

STRICT GUIDELINES:
1. CONCISE AND ASSERTIVE:
   - Keep the answer SHORT and DIRECT. At most 3 lines.
   - Use technical language. No filler.
   - Do not write \"the solution appears to support\". Write \"Natively supported via feature X\".

{hardware}

3. NOISE FILTERING:
   - If the requirement is ADMINISTRATIVE (deadlines, delivery, legal warranty, penalties), \
a PERSON NAME, an EMAIL or an RFP PROCESS step: answer \"N/A - Administrative/Logistic requirement\" \
and leave the verdict undetermined.
   - If it is about PRICE: answer \"N/A - Commercial\".

4. SOURCES AND LINKS (CRITICAL - DEEP SEARCH):
{deep_search}
   - The link MUST point to a technical document (Admin Guide, SK, KB article, datasheet PDF).
   - A generic marketing URL (such as the product home page) is a failure.
   - If you cannot find EXACT technical documentation, do not invent one. Leave the link empty.
   - Base the answer on your technical knowledge of {vendor}.

5. RESPONSE LANGUAGE: {language}.

MANDATORY RESPONSE FORMAT (keep these labels exactly as written):
{LABEL_VERDICT} [Sim/Não/Parcial]
{LABEL_MODEL} [Specific model name if cited or needed, otherwise leave empty]
{LABEL_LINK} [Bare, specific, technical URL]
{LABEL_DESCRIPTION} [Concise technical text citing the exact feature, CLI command or parameter that meets the requirement.]
"
        )
    }
}

#[cfg(test)]
mod tests {
    use requirements::SecurityDomain;

    use super::*;

    fn ctx(domain: SecurityDomain, vendor: &str) -> VendorContext {
        VendorContext::new(domain, vendor).unwrap()
    }

    #[test]
    fn prompt_is_deterministic() {
        let builder = PromptBuilder::new();
        let c = ctx(SecurityDomain::NetworkSecurity, "Fortinet");
        let a = builder.build("Must support SD-WAN", &c, Language::En, Some("FortiGate 200F"));
        let b = builder.build("Must support SD-WAN", &c, Language::En, Some("FortiGate 200F"));
        assert_eq!(a, b);
    }

    #[test]
    fn vendor_rules_first_match_wins() {
        let builder = PromptBuilder::new();
        assert!(builder
            .deep_search_instruction("Check Point (CloudGuard WAF)")
            .contains("sc1.checkpoint.com"));
        assert!(builder
            .deep_search_instruction("Palo Alto Networks (Prisma Cloud)")
            .contains("docs.paloaltonetworks.com"));
        assert!(builder
            .deep_search_instruction("FORTINET")
            .contains("docs.fortinet.com"));
        assert!(builder.deep_search_instruction("Cisco").contains("cisco.com/c/en/us/td/docs/"));
        assert_eq!(builder.deep_search_instruction("Zscaler"), GENERIC_DEEP_SEARCH);
    }

    #[test]
    fn custom_rules_are_ordered() {
        let builder = PromptBuilder::with_rules(vec![
            DeepSearchRule::new(&["cloud"], "first"),
            DeepSearchRule::new(&["cloudflare"], "second"),
        ]);
        assert_eq!(builder.deep_search_instruction("Cloudflare"), "first");
        assert_eq!(builder.deep_search_instruction("Akamai"), GENERIC_DEEP_SEARCH);
    }

    #[test]
    fn locked_model_constrains_validation() {
        let builder = PromptBuilder::new();
        let c = ctx(SecurityDomain::NetworkSecurity, "Check Point");
        let prompt = builder.build("Must provide 40 Gbps firewall", &c, Language::Pt, Some("Quantum 6600"));
        assert!(prompt.contains("(LOCKED)"));
        assert!(prompt.contains("\"Quantum 6600\""));
        assert!(!prompt.contains("CHOOSE EXACTLY ONE"));

        let unlocked = builder.build("Must provide 40 Gbps firewall", &c, Language::Pt, None);
        assert!(unlocked.contains("CHOOSE EXACTLY ONE (1) MODEL"));
        assert!(!unlocked.contains("(LOCKED)"));
    }

    #[test]
    fn prompt_embeds_grammar_language_and_requirement() {
        let builder = PromptBuilder::new();
        let c = ctx(SecurityDomain::EmailSecurity, "Proofpoint");
        let prompt = builder.build("Must quarantine phishing emails", &c, Language::Es, None);
        for label in [LABEL_VERDICT, LABEL_MODEL, LABEL_LINK, LABEL_DESCRIPTION] {
            assert!(prompt.contains(label), "missing label {label}");
        }
        assert!(prompt.contains("RESPONSE LANGUAGE: SPANISH"));
        assert!(prompt.contains("\"Must quarantine phishing emails\""));
        assert!(prompt.contains("Proofpoint (Email Security)"));
    }
}
