//! Random sample records for data-driven tests.
//!
//! Unlike scenario generation this is intentionally random; use
//! [`FixtureGenerator::seeded`] for reproducible output.

use chrono::{Duration, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::Result;
use crate::storage::write_atomically;

const FIRST_NAMES: &[&str] = &[
    "John", "Jane", "Michael", "Sarah", "David", "Emily", "James", "Emma", "Robert", "Olivia",
];
const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez",
];
const STREETS: &[&str] = &[
    "Main St", "Oak Ave", "Maple Dr", "Cedar Ln", "Pine Rd", "Elm St", "Washington Blvd",
    "Park Ave",
];
const CITIES: &[&str] = &[
    "Springfield", "Franklin", "Clinton", "Georgetown", "Madison", "Salem", "Arlington", "Bristol",
];
const STATES: &[&str] = &["CA", "TX", "FL", "NY", "PA", "IL", "OH", "GA", "NC", "MI"];
const POLICY_TYPES: &[&str] = &["Auto", "Home", "Life", "Commercial", "Umbrella"];
const COVERAGE_TYPES: &[&str] = &["Liability", "Comprehensive", "Collision", "Personal Injury"];
const LOSS_TYPES: &[&str] = &["Theft", "Fire", "Water Damage", "Vandalism", "Accident", "Weather"];
const CLAIM_STATUSES: &[&str] = &["Open", "Pending", "Under Review", "Approved", "Denied", "Closed"];
const ENDORSEMENT_TYPES: &[&str] = &[
    "Address Change",
    "Coverage Increase",
    "Add Driver",
    "Remove Vehicle",
    "Update Limits",
];
const PAYMENT_METHODS: &[&str] = &["Credit Card", "Debit Card", "ACH", "Check", "Wire Transfer"];
const FREQUENCIES: &[&str] = &["Monthly", "Quarterly", "Semi-Annual", "Annual"];

/// Kinds of fixture records that can be generated in bulk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureKind {
    Policy,
    Claim,
    Customer,
    Endorsement,
    Billing,
}

impl FixtureKind {
    pub fn all() -> &'static [FixtureKind] {
        &[
            FixtureKind::Policy,
            FixtureKind::Claim,
            FixtureKind::Customer,
            FixtureKind::Endorsement,
            FixtureKind::Billing,
        ]
    }

    /// Default output file name, e.g. `policies.json`
    pub fn default_file_name(&self) -> &'static str {
        match self {
            FixtureKind::Policy => "policies.json",
            FixtureKind::Claim => "claims.json",
            FixtureKind::Customer => "customers.json",
            FixtureKind::Endorsement => "endorsements.json",
            FixtureKind::Billing => "billing.json",
        }
    }
}

impl fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureKind::Policy => write!(f, "policy"),
            FixtureKind::Claim => write!(f, "claim"),
            FixtureKind::Customer => write!(f, "customer"),
            FixtureKind::Endorsement => write!(f, "endorsement"),
            FixtureKind::Billing => write!(f, "billing"),
        }
    }
}

impl FromStr for FixtureKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "policy" | "policies" => Ok(FixtureKind::Policy),
            "claim" | "claims" => Ok(FixtureKind::Claim),
            "customer" | "customers" => Ok(FixtureKind::Customer),
            "endorsement" | "endorsements" => Ok(FixtureKind::Endorsement),
            "billing" => Ok(FixtureKind::Billing),
            _ => Err(format!(
                "Invalid fixture kind: {}. Valid values: policy, claim, customer, endorsement, billing",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub ssn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub policy_number: String,
    pub policy_type: String,
    pub effective_date: String,
    pub expiration_date: String,
    pub premium: u32,
    pub coverage_type: String,
    pub coverage_amount: u32,
    pub deductible: u32,
    pub customer: Customer,
    pub address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub claim_number: String,
    pub policy_number: String,
    pub loss_date: String,
    pub report_date: String,
    pub loss_type: String,
    pub loss_description: String,
    pub estimated_amount: u32,
    pub status: String,
    pub claimant: Customer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Endorsement {
    pub policy_number: String,
    pub endorsement_type: String,
    pub effective_date: String,
    pub reason: String,
    pub premium_change: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Billing {
    pub policy_number: String,
    pub payment_method: String,
    pub frequency: String,
    pub amount: u32,
    pub due_date: String,
    pub account_number: String,
}

/// Any generated record
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Fixture {
    Policy(Policy),
    Claim(Claim),
    Customer(Customer),
    Endorsement(Endorsement),
    Billing(Billing),
}

/// Random fixture generator
pub struct FixtureGenerator {
    rng: StdRng,
    /// Reference date for relative dates
    today: NaiveDate,
}

impl Default for FixtureGenerator {
    fn default() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            today: Local::now().date_naive(),
        }
    }
}

impl FixtureGenerator {
    /// Deterministic generator for a fixed seed and reference date
    pub fn seeded(seed: u64, today: NaiveDate) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            today,
        }
    }

    fn pick(&mut self, items: &[&str]) -> String {
        items
            .choose(&mut self.rng)
            .copied()
            .unwrap_or_default()
            .to_string()
    }

    fn number(&mut self, min: u32, max: u32) -> u32 {
        self.rng.gen_range(min..=max)
    }

    /// ISO date `days` from the reference date (negative for the past)
    fn date(&self, days: i64) -> String {
        (self.today + Duration::days(days))
            .format("%Y-%m-%d")
            .to_string()
    }

    pub fn policy_number(&mut self) -> String {
        format!("POL-{}", self.number(100_000, 999_999))
    }

    pub fn claim_number(&mut self) -> String {
        format!("CLM-{}", self.number(100_000, 999_999))
    }

    pub fn phone_number(&mut self) -> String {
        format!(
            "{}-{}-{}",
            self.number(200, 999),
            self.number(200, 999),
            self.number(1000, 9999)
        )
    }

    pub fn ssn(&mut self) -> String {
        format!(
            "{}-{}-{}",
            self.number(100, 999),
            self.number(10, 99),
            self.number(1000, 9999)
        )
    }

    pub fn customer(&mut self) -> Customer {
        let first_name = self.pick(FIRST_NAMES);
        let last_name = self.pick(LAST_NAMES);
        // 18 to roughly 45 years old
        let age_days = i64::from(self.number(6570, 16_569));

        Customer {
            full_name: format!("{} {}", first_name, last_name),
            email: format!(
                "{}.{}@example.com",
                first_name.to_lowercase(),
                last_name.to_lowercase()
            ),
            phone: self.phone_number(),
            date_of_birth: self.date(-age_days),
            ssn: self.ssn(),
            first_name,
            last_name,
        }
    }

    pub fn address(&mut self) -> Address {
        Address {
            street: format!("{} {}", self.number(100, 9999), self.pick(STREETS)),
            city: self.pick(CITIES),
            state: self.pick(STATES),
            zip: self.number(10_000, 99_999).to_string(),
            country: "USA".to_string(),
        }
    }

    pub fn policy(&mut self) -> Policy {
        Policy {
            policy_number: self.policy_number(),
            policy_type: self.pick(POLICY_TYPES),
            effective_date: self.date(1),
            expiration_date: self.date(366),
            premium: self.number(500, 5000),
            coverage_type: self.pick(COVERAGE_TYPES),
            coverage_amount: self.number(50_000, 1_000_000),
            deductible: self.number(250, 2500),
            customer: self.customer(),
            address: self.address(),
        }
    }

    pub fn claim(&mut self) -> Claim {
        let loss_days = i64::from(self.number(0, 59));
        let report_days = i64::from(self.number(0, 29));
        Claim {
            claim_number: self.claim_number(),
            policy_number: self.policy_number(),
            loss_date: self.date(-loss_days),
            report_date: self.date(-report_days),
            loss_type: self.pick(LOSS_TYPES),
            loss_description: "Test claim description for automated testing".to_string(),
            estimated_amount: self.number(1000, 50_000),
            status: self.pick(CLAIM_STATUSES),
            claimant: self.customer(),
        }
    }

    pub fn endorsement(&mut self) -> Endorsement {
        Endorsement {
            policy_number: self.policy_number(),
            endorsement_type: self.pick(ENDORSEMENT_TYPES),
            effective_date: self.date(1),
            reason: "Test endorsement for automated testing".to_string(),
            premium_change: self.rng.gen_range(-500..=500),
        }
    }

    pub fn billing(&mut self) -> Billing {
        Billing {
            policy_number: self.policy_number(),
            payment_method: self.pick(PAYMENT_METHODS),
            frequency: self.pick(FREQUENCIES),
            amount: self.number(100, 1000),
            due_date: self.date(30),
            account_number: self
                .rng
                .gen_range(1_000_000_000u64..=9_999_999_999)
                .to_string(),
        }
    }

    /// Generate `count` records of one kind
    pub fn batch(&mut self, kind: FixtureKind, count: usize) -> Vec<Fixture> {
        (0..count)
            .map(|_| match kind {
                FixtureKind::Policy => Fixture::Policy(self.policy()),
                FixtureKind::Claim => Fixture::Claim(self.claim()),
                FixtureKind::Customer => Fixture::Customer(self.customer()),
                FixtureKind::Endorsement => Fixture::Endorsement(self.endorsement()),
                FixtureKind::Billing => Fixture::Billing(self.billing()),
            })
            .collect()
    }
}

/// Save generated records as a pretty-printed JSON array
pub fn save_fixtures<P: AsRef<Path>>(fixtures: &[Fixture], path: P) -> Result<()> {
    let json = serde_json::to_string_pretty(fixtures)?;
    write_atomically(path.as_ref(), json.as_bytes())
}
