//! The seven source contracts.

use super::{Constraint, FieldKind, FieldSpec, IdPattern, RecordContract};
use crate::domain::SourceName;

const AGENCY: FieldSpec = FieldSpec {
    name: "agency",
    kind: FieldKind::Str,
    constraints: &[Constraint::Pattern(IdPattern::Agency)],
};

const SKU: FieldSpec = FieldSpec {
    name: "sku",
    kind: FieldKind::Str,
    constraints: &[Constraint::Pattern(IdPattern::Sku)],
};

/// `year_month` with the month check only.
const YEAR_MONTH: FieldSpec = FieldSpec {
    name: "year_month",
    kind: FieldKind::Int,
    constraints: &[
        Constraint::Ge(201301.0),
        Constraint::Le(999912.0),
        Constraint::YearMonth { years: None },
    ],
};

/// `year_month` with the month check and `2000 ≤ year ≤ 2100`.
const YEAR_MONTH_BOUNDED: FieldSpec = FieldSpec {
    name: "year_month",
    kind: FieldKind::Int,
    constraints: &[
        Constraint::Ge(201301.0),
        Constraint::Le(999912.0),
        Constraint::YearMonth {
            years: Some((2000, 2100)),
        },
    ],
};

const NON_NEGATIVE: &[Constraint] = &[Constraint::Ge(0.0)];
const POSITIVE: &[Constraint] = &[Constraint::Gt(0.0)];
const BINARY: &[Constraint] = &[Constraint::Ge(0.0), Constraint::Le(1.0)];

const fn non_negative(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        constraints: NON_NEGATIVE,
    }
}

const fn positive(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Int,
        constraints: POSITIVE,
    }
}

const fn flag(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Int,
        constraints: BINARY,
    }
}

/// Binary event columns of the event calendar, in file order.
pub const EVENT_FLAGS: [&str; 12] = [
    "easter_day",
    "good_friday",
    "new_year",
    "christmas",
    "labor_day",
    "independence_day",
    "revolution_day_memorial",
    "regional_games",
    "fifa_u17_world_cup",
    "football_gold_cup",
    "beer_capital",
    "music_fest",
];

pub static HISTORICAL_VOLUME: RecordContract = RecordContract {
    name: "HistoricalVolumeRecord",
    fields: &[
        AGENCY,
        SKU,
        YEAR_MONTH_BOUNDED,
        non_negative("volume", FieldKind::Float),
    ],
};

pub static PRICE_SALES_PROMOTION: RecordContract = RecordContract {
    name: "PriceSalesPromotionRecord",
    fields: &[
        AGENCY,
        SKU,
        YEAR_MONTH_BOUNDED,
        non_negative("price", FieldKind::Float),
        non_negative("sales", FieldKind::Float),
        non_negative("promotions", FieldKind::Float),
    ],
};

pub static EVENT_CALENDAR: RecordContract = RecordContract {
    name: "EventCalendarRecord",
    fields: &[
        YEAR_MONTH,
        flag(EVENT_FLAGS[0]),
        flag(EVENT_FLAGS[1]),
        flag(EVENT_FLAGS[2]),
        flag(EVENT_FLAGS[3]),
        flag(EVENT_FLAGS[4]),
        flag(EVENT_FLAGS[5]),
        flag(EVENT_FLAGS[6]),
        flag(EVENT_FLAGS[7]),
        flag(EVENT_FLAGS[8]),
        flag(EVENT_FLAGS[9]),
        flag(EVENT_FLAGS[10]),
        flag(EVENT_FLAGS[11]),
    ],
};

pub static WEATHER: RecordContract = RecordContract {
    name: "WeatherRecord",
    fields: &[
        YEAR_MONTH,
        AGENCY,
        FieldSpec {
            name: "avg_max_temp",
            kind: FieldKind::Float,
            constraints: &[Constraint::Ge(-50.0), Constraint::Le(60.0)],
        },
    ],
};

pub static DEMOGRAPHICS: RecordContract = RecordContract {
    name: "DemographicsRecord",
    fields: &[
        AGENCY,
        positive("avg_population_2017"),
        positive("avg_yearly_household_income_2017"),
    ],
};

pub static INDUSTRY_VOLUME: RecordContract = RecordContract {
    name: "IndustryVolumeRecord",
    fields: &[YEAR_MONTH, non_negative("industry_volume", FieldKind::Int)],
};

pub static INDUSTRY_SODA_SALES: RecordContract = RecordContract {
    name: "IndustrySodaSalesRecord",
    fields: &[YEAR_MONTH, non_negative("soda_volume", FieldKind::Int)],
};

pub fn contract_for(source: SourceName) -> &'static RecordContract {
    match source {
        SourceName::HistoricalVolume => &HISTORICAL_VOLUME,
        SourceName::PriceSalesPromotion => &PRICE_SALES_PROMOTION,
        SourceName::EventCalendar => &EVENT_CALENDAR,
        SourceName::Weather => &WEATHER,
        SourceName::Demographics => &DEMOGRAPHICS,
        SourceName::IndustryVolume => &INDUSTRY_VOLUME,
        SourceName::IndustrySodaSales => &INDUSTRY_SODA_SALES,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::{Table, Value};

    fn one_row(columns: &[&str], values: Vec<Value>) -> Table {
        Table::new(columns.iter().map(|c| c.to_string()).collect(), vec![values])
    }

    fn historical(year_month: i64) -> Table {
        one_row(
            &["agency", "sku", "year_month", "volume"],
            vec![
                Value::Str("Agency_01".into()),
                Value::Str("SKU_001".into()),
                Value::Int(year_month),
                Value::Float(500.0),
            ],
        )
    }

    fn industry(year_month: i64) -> Table {
        one_row(
            &["year_month", "industry_volume"],
            vec![Value::Int(year_month), Value::Int(492612703)],
        )
    }

    #[rstest]
    #[case(201301, true)]
    #[case(201313, false)]
    #[case(200001, false)]
    #[case(210012, true)]
    #[case(210101, false)]
    fn historical_year_month(#[case] year_month: i64, #[case] ok: bool) {
        let t = historical(year_month);
        assert_eq!(HISTORICAL_VOLUME.validate(&t.record(0)).is_ok(), ok);
    }

    #[rstest]
    #[case(201301, true)]
    #[case(201313, false)]
    #[case(200001, false)]
    #[case(210101, true)]
    #[case(999912, true)]
    fn industry_year_month(#[case] year_month: i64, #[case] ok: bool) {
        let t = industry(year_month);
        assert_eq!(INDUSTRY_VOLUME.validate(&t.record(0)).is_ok(), ok);
    }

    #[test]
    fn violations_are_collected_across_fields() {
        let t = one_row(
            &["agency", "sku", "year_month", "volume"],
            vec![
                Value::Str("Agcy_1".into()),
                Value::Str("SKU_001".into()),
                Value::Int(201313),
                Value::Float(-1.0),
            ],
        );
        let violations = HISTORICAL_VOLUME.validate(&t.record(0)).unwrap_err();
        let fields: Vec<_> = violations.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["agency", "year_month", "volume"]);
    }

    #[test]
    fn missing_field_is_reported() {
        let t = one_row(&["agency"], vec![Value::Str("Agency_01".into())]);
        let violations = DEMOGRAPHICS.validate(&t.record(0)).unwrap_err();
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.message == "Field required"));
    }

    #[test]
    fn event_flags_are_binary() {
        let mut columns = vec!["year_month"];
        columns.extend(EVENT_FLAGS);
        let mut values = vec![Value::Int(201301)];
        values.extend(std::iter::repeat_n(Value::Int(0), 12));
        values[3] = Value::Int(2);
        let t = one_row(&columns, values);
        let violations = EVENT_CALENDAR.validate(&t.record(0)).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "new_year");
    }

    #[test]
    fn weather_temperature_range() {
        let row = |temp: f64| {
            one_row(
                &["year_month", "agency", "avg_max_temp"],
                vec![Value::Int(201301), Value::Str("Agency_01".into()), Value::Float(temp)],
            )
        };
        assert!(WEATHER.validate(&row(-50.0).record(0)).is_ok());
        assert!(WEATHER.validate(&row(60.5).record(0)).is_err());
    }

    #[test]
    fn demographics_require_strictly_positive() {
        let t = one_row(
            &["agency", "avg_population_2017", "avg_yearly_household_income_2017"],
            vec![Value::Str("Agency_01".into()), Value::Int(0), Value::Int(120000)],
        );
        let violations = DEMOGRAPHICS.validate(&t.record(0)).unwrap_err();
        assert_eq!(violations[0].field, "avg_population_2017");
    }
}
