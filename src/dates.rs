use time::{macros::format_description, Date, Duration};

pub fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// `(day_of_week, date)` for Monday (1) through Sunday (7) of the week starting at `monday`.
pub fn week_days(monday: Date) -> impl Iterator<Item = (i16, Date)> {
    (0..7i16).map(move |offset| (offset + 1, monday + Duration::days(offset as i64)))
}

/// Serde adapter writing dates as `YYYY-MM-DD`.
pub mod iso_date {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(date)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_date(&raw).ok_or_else(|| D::Error::custom("expected a YYYY-MM-DD date"))
    }

    pub mod option {
        use serde::{de::Error, Deserialize, Deserializer, Serializer};
        use time::Date;

        pub fn serialize<S: Serializer>(date: &Option<Date>, s: S) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => s.collect_str(d),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Date>, D::Error> {
            match Option::<String>::deserialize(d)? {
                None => Ok(None),
                Some(raw) => super::super::parse_date(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom("expected a YYYY-MM-DD date")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use time::macros::date;

    #[derive(Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "iso_date")]
        day: Date,
        #[serde(with = "iso_date::option", default)]
        maybe: Option<Date>,
    }

    #[test]
    fn week_runs_monday_to_sunday() {
        let days: Vec<_> = week_days(date!(2024 - 01 - 01)).collect();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], (1, date!(2024 - 01 - 01)));
        assert_eq!(days[6], (7, date!(2024 - 01 - 07)));
    }

    #[test]
    fn iso_dates_serialise_as_strings() {
        let h = Holder {
            day: date!(2024 - 03 - 04),
            maybe: None,
        };
        let json = serde_json::to_value(&h).unwrap();
        assert_eq!(json, serde_json::json!({"day": "2024-03-04", "maybe": null}));

        let back: Holder = serde_json::from_str(r#"{"day":"2024-03-11"}"#).unwrap();
        assert_eq!(back.day, date!(2024 - 03 - 11));
        assert!(back.maybe.is_none());
        assert!(serde_json::from_str::<Holder>(r#"{"day":"11/03/2024"}"#).is_err());
    }
}
