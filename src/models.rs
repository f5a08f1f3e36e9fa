//! Data models for the satisfaction ledger.
//!
//! This module contains the ratings, running aggregates, query views and
//! wire shapes shared by the ledger, the batch replayer and the reports.

use crate::error::{LedgerError, ERR_INVALID_RATING};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sequential rating identifier. The first accepted rating gets 1.
pub type RatingId = u64;

/// Support ticket identifier.
pub type TicketId = u64;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;

/// A star score, guaranteed to be within 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "i64")]
pub struct Score(u8);

impl Score {
    pub fn new(value: i64) -> Result<Self, LedgerError> {
        if (i64::from(MIN_SCORE)..=i64::from(MAX_SCORE)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(LedgerError::InvalidRating { score: value })
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_five_star(self) -> bool {
        self.0 == MAX_SCORE
    }
}

impl TryFrom<i64> for Score {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Score::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A recorded customer rating. Never modified after it is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub id: RatingId,
    /// Principal of the submitting customer.
    pub customer: String,
    pub ticket_id: TicketId,
    /// Principal of the manager the ticket rolls up to.
    pub manager: String,
    pub score: Score,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// A rating submission as it arrives from a caller or a batch file.
///
/// `score` is a plain integer so that out-of-range values reach
/// validation and come back as `INVALID_RATING`. Any JSON number is
/// accepted: integers beyond `i64` saturate and fractional values map to
/// `i64::MAX`, both of which fail validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    pub customer: String,
    pub ticket_id: TicketId,
    #[serde(rename = "managerId")]
    pub manager: String,
    #[serde(deserialize_with = "lenient_score")]
    pub score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

fn lenient_score<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct ScoreVisitor;

    impl serde::de::Visitor<'_> for ScoreVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a numeric score")
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<i64, E> {
            Ok(i64::try_from(v).unwrap_or(i64::MAX))
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<i64, E> {
            if v.fract() == 0.0 {
                // Float to int casts saturate.
                Ok(v as i64)
            } else {
                Ok(i64::MAX)
            }
        }
    }

    deserializer.deserialize_any(ScoreVisitor)
}

/// Running totals for one aggregate (ticket, manager or global).
///
/// All derived statistics use truncating integer division.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub rating_sum: u64,
    pub total_ratings: u64,
    pub five_star_count: u64,
    /// Ratings per star value, index 0 is one star.
    pub distribution: [u64; 5],
}

impl Tally {
    /// Add one accepted score.
    pub fn record(&mut self, score: Score) {
        self.rating_sum += u64::from(score.value());
        self.total_ratings += 1;
        if score.is_five_star() {
            self.five_star_count += 1;
        }
        self.distribution[(score.value() - MIN_SCORE) as usize] += 1;
    }

    /// `floor(rating_sum / total_ratings)`, or 0 with no ratings.
    pub fn average_rating(&self) -> u64 {
        if self.total_ratings == 0 {
            0
        } else {
            self.rating_sum / self.total_ratings
        }
    }

    /// `floor(five_star_count * 100 / total_ratings)`, or 0 with no ratings.
    pub fn five_star_percentage(&self) -> u64 {
        if self.total_ratings == 0 {
            0
        } else {
            self.five_star_count * 100 / self.total_ratings
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_ratings == 0
    }

    pub fn ticket_summary(&self) -> TicketSatisfaction {
        TicketSatisfaction {
            average_rating: self.average_rating(),
            total_ratings: self.total_ratings,
        }
    }

    pub fn manager_summary(&self) -> ManagerSatisfaction {
        ManagerSatisfaction {
            average_rating: self.average_rating(),
            total_ratings: self.total_ratings,
            five_star_count: self.five_star_count,
        }
    }

    pub fn global_summary(&self) -> GlobalSatisfaction {
        GlobalSatisfaction {
            average_rating: self.average_rating(),
            total_ratings: self.total_ratings,
        }
    }

    pub fn trend(&self) -> SatisfactionTrend {
        SatisfactionTrend {
            avg_rating: self.average_rating(),
            total_ratings: self.total_ratings,
            five_star_percentage: self.five_star_percentage(),
        }
    }
}

/// Ticket satisfaction as returned to callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSatisfaction {
    pub average_rating: u64,
    pub total_ratings: u64,
}

/// Manager satisfaction as returned to callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerSatisfaction {
    pub average_rating: u64,
    pub total_ratings: u64,
    pub five_star_count: u64,
}

/// Satisfaction across every accepted rating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSatisfaction {
    pub average_rating: u64,
    pub total_ratings: u64,
}

/// Trend view over a manager aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SatisfactionTrend {
    pub avg_rating: u64,
    pub total_ratings: u64,
    pub five_star_percentage: u64,
}

/// Tagged result: `{"type": "ok", "value": ...}` or `{"type": "error", "value": 501}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ContractResult<T> {
    Ok(T),
    Error(u32),
}

impl<T> ContractResult<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, ContractResult::Ok(_))
    }
}

impl<T> From<Result<T, LedgerError>> for ContractResult<T> {
    fn from(result: Result<T, LedgerError>) -> Self {
        match result {
            Ok(value) => ContractResult::Ok(value),
            Err(e) => ContractResult::Error(e.code()),
        }
    }
}

/// Consistent copy of every aggregate, taken under one lock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub tickets: BTreeMap<TicketId, Tally>,
    pub managers: BTreeMap<String, Tally>,
    pub global: Tally,
    pub ratings_recorded: u64,
}

/// A submission that the ledger refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// 1-based position of the submission in its batch.
    pub position: usize,
    pub customer: String,
    pub ticket_id: TicketId,
    pub code: u32,
    pub name: String,
    pub message: String,
}

impl Rejection {
    pub fn new(position: usize, request: &RatingRequest, err: &LedgerError) -> Self {
        Self {
            position,
            customer: request.customer.clone(),
            ticket_id: request.ticket_id,
            code: err.code(),
            name: err.name().to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_invalid_rating(&self) -> bool {
        self.code == ERR_INVALID_RATING
    }
}

/// Per-manager section of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerEntry {
    pub manager: String,
    pub satisfaction: ManagerSatisfaction,
    pub trend: SatisfactionTrend,
    pub distribution: [u64; 5],
}

/// Per-ticket section of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketEntry {
    pub ticket_id: TicketId,
    pub satisfaction: TicketSatisfaction,
}

/// Metadata about a replay report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Batch file the ratings were replayed from.
    pub input: String,
    pub generated_at: DateTime<Utc>,
    pub submissions: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub duration_seconds: f64,
}

/// The complete satisfaction report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub global: GlobalSatisfaction,
    pub global_five_star_percentage: u64,
    pub distribution: [u64; 5],
    pub managers: Vec<ManagerEntry>,
    pub tickets: Vec<TicketEntry>,
    pub rejections: Vec<Rejection>,
}

impl Report {
    /// Builds a report from a ledger snapshot and the rejected submissions.
    pub fn from_snapshot(
        metadata: ReportMetadata,
        snapshot: &LedgerSnapshot,
        rejections: Vec<Rejection>,
    ) -> Self {
        let managers = snapshot
            .managers
            .iter()
            .map(|(manager, tally)| ManagerEntry {
                manager: manager.clone(),
                satisfaction: tally.manager_summary(),
                trend: tally.trend(),
                distribution: tally.distribution,
            })
            .collect();

        let tickets = snapshot
            .tickets
            .iter()
            .map(|(ticket_id, tally)| TicketEntry {
                ticket_id: *ticket_id,
                satisfaction: tally.ticket_summary(),
            })
            .collect();

        Self {
            metadata,
            global: snapshot.global.global_summary(),
            global_five_star_percentage: snapshot.global.five_star_percentage(),
            distribution: snapshot.global.distribution,
            managers,
            tickets,
            rejections,
        }
    }

    /// Rejections grouped by error code.
    pub fn rejections_by_code(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for rejection in &self.rejections {
            *counts.entry(rejection.code).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(v: i64) -> Score {
        Score::new(v).unwrap()
    }

    #[test]
    fn test_request_score_accepts_any_number() {
        let parse = |score: &str| {
            let json = format!(
                r#"{{"customer":"a","ticketId":1,"managerId":"m","score":{}}}"#,
                score
            );
            serde_json::from_str::<RatingRequest>(&json).map(|r| r.score)
        };

        assert_eq!(parse("4").unwrap(), 4);
        assert_eq!(parse("-2").unwrap(), -2);
        assert_eq!(parse("5.0").unwrap(), 5);
        assert_eq!(parse("18446744073709551615").unwrap(), i64::MAX);
        assert_eq!(parse("99999999999999999999").unwrap(), i64::MAX);
        assert_eq!(parse("-99999999999999999999").unwrap(), i64::MIN);
        assert_eq!(parse("4.5").unwrap(), i64::MAX);
        assert!(parse("\"4\"").is_err());

        for huge in [i64::MAX, i64::MIN] {
            assert!(Score::new(huge).is_err());
        }
    }

    #[test]
    fn test_score_range() {
        assert!(Score::new(0).is_err());
        assert!(Score::new(6).is_err());
        assert!(Score::new(-3).is_err());
        assert_eq!(score(1).value(), 1);
        assert_eq!(score(5).value(), 5);
        assert!(score(5).is_five_star());
        assert!(!score(4).is_five_star());
    }

    #[test]
    fn test_score_rejects_out_of_range_json() {
        let ok: Score = serde_json::from_str("3").unwrap();
        assert_eq!(ok.value(), 3);
        assert!(serde_json::from_str::<Score>("6").is_err());
    }

    #[test]
    fn test_tally_truncates_average() {
        let mut tally = Tally::default();
        tally.record(score(4));
        tally.record(score(5));

        assert_eq!(tally.rating_sum, 9);
        assert_eq!(tally.total_ratings, 2);
        assert_eq!(tally.average_rating(), 4);
        assert_eq!(tally.five_star_count, 1);
        assert_eq!(tally.five_star_percentage(), 50);
    }

    #[test]
    fn test_tally_truncates_percentage() {
        let mut tally = Tally::default();
        for s in [4, 5, 3] {
            tally.record(score(s));
        }

        assert_eq!(
            tally.trend(),
            SatisfactionTrend {
                avg_rating: 4,
                total_ratings: 3,
                five_star_percentage: 33,
            }
        );
        assert_eq!(tally.distribution, [0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_tally_zero_state() {
        let tally = Tally::default();
        assert!(tally.is_empty());
        assert_eq!(tally.average_rating(), 0);
        assert_eq!(tally.five_star_percentage(), 0);
        assert_eq!(tally.ticket_summary(), TicketSatisfaction::default());
        assert_eq!(tally.trend(), SatisfactionTrend::default());
    }

    #[test]
    fn test_contract_result_shape() {
        let ok: ContractResult<u64> = Ok(1).into();
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({"type": "ok", "value": 1})
        );

        let err: ContractResult<u64> = Err(LedgerError::InvalidRating { score: 6 }).into();
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({"type": "error", "value": 501})
        );
    }

    #[test]
    fn test_trend_wire_names() {
        let trend = SatisfactionTrend {
            avg_rating: 4,
            total_ratings: 3,
            five_star_percentage: 33,
        };
        assert_eq!(
            serde_json::to_value(trend).unwrap(),
            serde_json::json!({"avgRating": 4, "totalRatings": 3, "fiveStarPercentage": 33})
        );
    }

    #[test]
    fn test_request_parsing() {
        let request: RatingRequest = serde_json::from_str(
            r#"{"customer":"ST2CY","ticketId":7,"managerId":"ST2JHG","score":6}"#,
        )
        .unwrap();
        assert_eq!(request.ticket_id, 7);
        assert_eq!(request.manager, "ST2JHG");
        assert_eq!(request.score, 6);
        assert_eq!(request.feedback, None);
    }

    #[test]
    fn test_rejections_by_code() {
        let request = RatingRequest {
            customer: "ST2CY".to_string(),
            ticket_id: 1,
            manager: "ST2JHG".to_string(),
            score: 9,
            feedback: None,
        };
        let err = LedgerError::InvalidRating { score: 9 };
        let metadata = ReportMetadata {
            input: "ratings.json".to_string(),
            generated_at: Utc::now(),
            submissions: 2,
            accepted: 0,
            rejected: 2,
            duration_seconds: 0.0,
        };
        let report = Report::from_snapshot(
            metadata,
            &LedgerSnapshot::default(),
            vec![Rejection::new(1, &request, &err), Rejection::new(2, &request, &err)],
        );

        assert!(report.rejections[0].is_invalid_rating());
        assert_eq!(report.rejections_by_code().get(&501), Some(&2));
        assert_eq!(report.global, GlobalSatisfaction::default());
    }
}
