use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── Parsed clauses ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskFlag {
    Standard,
    Unusual,
}

/// One clause as extracted by the parse flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Clause {
    /// A unique identifier for the clause, e.g. "C1", "C2".
    pub clause_id: String,
    /// The type of clause, e.g. "Termination", "Payment", "Confidentiality".
    #[serde(rename = "type")]
    pub clause_type: String,
    /// The full body text of the clause.
    pub text: String,
    /// Whether the clause is standard or unusual.
    pub risk_flag: RiskFlag,
    /// A brief explanation if the clause is flagged as unusual.
    #[serde(default)]
    pub explanation: String,
}

// ── Risk assessment ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// A risk found in one clause, with a suggested counter-proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClauseRisk {
    /// The identifier of the clause that contains the risk, e.g. "C1".
    pub clause_id: String,
    /// The assessed risk level for the clause.
    pub risk_level: RiskLevel,
    /// A clear description of the identified issue or risk.
    pub issue: String,
    /// The suggested wording or change to mitigate the risk.
    pub suggested_change: String,
    /// Whether the clause is risky.
    pub is_risky: bool,
}

// ── Document view-model ──────────────────────────────────────────────────

/// Display label of a clause in the document viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLabel {
    Risky,
    Negotiable,
    #[default]
    Standard,
}

impl RiskLabel {
    /// HIGH risks are risky, any other flagged risk is negotiable,
    /// everything else (including `isRisky: false`) is standard.
    pub fn from_assessment(risk: Option<&ClauseRisk>) -> Self {
        match risk {
            Some(r) if r.is_risky && r.risk_level == RiskLevel::High => Self::Risky,
            Some(r) if r.is_risky => Self::Negotiable,
            _ => Self::Standard,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Risky => "risky",
            Self::Negotiable => "negotiable",
            Self::Standard => "standard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewClause {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause_title: Option<String>,
    pub text: String,
    #[serde(default)]
    pub risk: RiskLabel,
    #[serde(rename = "summary_eli5")]
    pub summary_eli5: String,
    #[serde(rename = "summary_eli15")]
    pub summary_eli15: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_proposal: Option<String>,
}

/// One analyzed document, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    pub title: String,
    pub summary: String,
    pub clauses: Vec<ViewClause>,
    /// Unset for the built-in sample.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RiskCounts {
    pub risky: usize,
    pub negotiable: usize,
    pub standard: usize,
}

impl DocumentView {
    /// Clause texts joined by blank lines; the input other flows receive.
    pub fn full_text(&self) -> String {
        self.clauses
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn risk_counts(&self) -> RiskCounts {
        let mut counts = RiskCounts::default();
        for clause in &self.clauses {
            match clause.risk {
                RiskLabel::Risky => counts.risky += 1,
                RiskLabel::Negotiable => counts.negotiable += 1,
                RiskLabel::Standard => counts.standard += 1,
            }
        }
        counts
    }

    pub fn clause(&self, id: &str) -> Option<&ViewClause> {
        self.clauses.iter().find(|c| c.id == id)
    }
}

// ── Sample document ──────────────────────────────────────────────────────

fn sample_clause(
    id: &str,
    title: &str,
    risk: RiskLabel,
    text: &str,
    eli5: &str,
    eli15: &str,
    counter_proposal: Option<&str>,
) -> ViewClause {
    ViewClause {
        id: id.into(),
        clause_title: Some(title.into()),
        text: text.into(),
        risk,
        summary_eli5: eli5.into(),
        summary_eli15: eli15.into(),
        counter_proposal: counter_proposal.map(str::to_string),
    }
}

/// The residential lease shown when no document has been analyzed yet.
pub fn sample_document() -> DocumentView {
    use RiskLabel::{Negotiable, Risky, Standard};

    DocumentView {
        title: "Standard Residential Lease Agreement".into(),
        summary: "This is a standard rental contract. It has one risky clause about the security \
                  deposit and two negotiable points regarding maintenance and early termination. \
                  Overall, it is mostly fair but review the highlighted sections carefully."
            .into(),
        clauses: vec![
            sample_clause(
                "c1",
                "Parties",
                Standard,
                "This Lease Agreement (\"the Agreement\") is made and entered into this 1st day of \
                 August, 2024, by and between John Landlord (\"Landlord\") and Jane Tenant (\"Tenant\").",
                "This says who the landlord and tenant are.",
                "This clause identifies the official parties bound by this contract: the person who \
                 owns the property (Landlord) and the person renting it (Tenant).",
                None,
            ),
            sample_clause(
                "c2",
                "Property",
                Standard,
                "Landlord agrees to lease to Tenant the property located at 123 Main Street, Anytown, \
                 USA 12345 (\"the Property\").",
                "This is the address of the place you are renting.",
                "This section specifies the exact address of the property that the Tenant is renting \
                 from the Landlord.",
                None,
            ),
            sample_clause(
                "c3",
                "Lease Term",
                Standard,
                "The term of this lease shall be for a period of 12 months, beginning on September 1, \
                 2024, and ending on August 31, 2025.",
                "Your lease is for one year.",
                "This clause defines the duration of the lease. It specifies a fixed term of 12 \
                 months, including the official start and end dates of the rental period.",
                None,
            ),
            sample_clause(
                "c4",
                "Rent",
                Standard,
                "Tenant shall pay Landlord a monthly rent of $2,000, due on the 1st day of each month. \
                 A late fee of $100 will be applied if rent is not received by the 5th day of the month.",
                "Rent is $2,000 a month, due on the 1st. You get a $100 late fee after the 5th.",
                "This sets the monthly rent amount at $2,000, payable on the first of each month. It \
                 also establishes a $100 penalty if the payment is made after the 5th of the month.",
                None,
            ),
            sample_clause(
                "c5",
                "Security Deposit",
                Risky,
                "Tenant shall deposit with Landlord the sum of $4,000 as a security deposit. Landlord \
                 may use, apply or retain the whole or any part of the security deposit for any breach \
                 of this agreement. Landlord shall have 60 days after termination of tenancy to return \
                 the security deposit, less any deductions.",
                "You pay a $4,000 deposit. The landlord has 60 days to give it back and can use it for \
                 any broken rule.",
                "This clause requires a $4,000 security deposit. It gives the landlord broad power to \
                 use the deposit for any rule violation and allows a 60-day period to return it, which \
                 is longer than standard in many jurisdictions.",
                Some(
                    "The security deposit shall not exceed the value of one month's rent ($2,000). The \
                     landlord must return the security deposit, less itemized deductions, within 30 \
                     days of tenancy termination, in accordance with state law.",
                ),
            ),
            sample_clause(
                "c6",
                "Utilities",
                Standard,
                "Tenant shall be responsible for payment of all utilities and services, including but \
                 not limited to electricity, gas, water, and internet.",
                "You have to pay for all your own bills like power and internet.",
                "This clause clarifies that the Tenant is responsible for arranging and paying for all \
                 utility services for the property, such as electricity, gas, water, and internet access.",
                None,
            ),
            sample_clause(
                "c7",
                "Maintenance and Repairs",
                Negotiable,
                "Tenant shall maintain the property in a clean and sanitary condition. All repairs, \
                 excluding major structural issues, will be the responsibility of the Tenant.",
                "You must keep it clean and fix most things that break yourself.",
                "This clause makes the Tenant responsible for general cleanliness and most repairs, \
                 except for major structural problems. This is broader than typical leases, where \
                 landlords often cover appliance and system repairs.",
                Some(
                    "Tenant is responsible for minor repairs and cleanliness. Landlord is responsible \
                     for repairs to all appliances, plumbing, and HVAC systems provided with the property.",
                ),
            ),
            sample_clause(
                "c8",
                "Subletting",
                Standard,
                "Tenant shall not sublet the property or assign this agreement without the prior \
                 written consent of the Landlord.",
                "You can't let someone else rent your place unless the landlord says it's okay in writing.",
                "This clause prohibits the Tenant from renting out the property (subletting) or \
                 transferring the lease to someone else without first obtaining written permission \
                 from the Landlord.",
                None,
            ),
            sample_clause(
                "c9",
                "Termination",
                Negotiable,
                "If Tenant wishes to terminate this lease early, they must provide 60 days' notice and \
                 pay a termination fee equal to three months' rent.",
                "To leave early, you need to tell the landlord 60 days before and pay a big fee (3 \
                 months of rent).",
                "This clause outlines the penalties for early lease termination. The required 60-day \
                 notice and a fee equivalent to three months' rent is steep and could be negotiated down.",
                Some(
                    "For early termination, Tenant must provide 30 days' written notice and pay a fee \
                     equal to one month's rent.",
                ),
            ),
            sample_clause(
                "c10",
                "Governing Law",
                Standard,
                "This agreement shall be governed by and construed in accordance with the laws of the \
                 State of California.",
                "The rules for this contract are based on California law.",
                "This clause specifies that any legal interpretation or dispute related to this \
                 agreement will be resolved according to the laws of the State of California.",
                None,
            ),
        ],
        analyzed_at: None,
    }
}
