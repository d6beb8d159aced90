use chrono::NaiveDate;
use serde::de::{Deserialize, Deserializer};
use serde::ser::Serializer;

pub fn parse_date(s: &str) -> Result<NaiveDate, crate::Error> {
    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|_| crate::Error::InvalidDate(s.to_owned()))
}

pub fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s: &str = Deserialize::deserialize(deserializer)?;
    parse_date(s).map_err(serde::de::Error::custom)
}

pub fn serialize_date<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date.format("%Y%m%d").to_string())
}

pub fn deserialize_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s: &str = Deserialize::deserialize(deserializer)?;
    match s {
        "0" => Ok(false),
        "1" => Ok(true),
        &_ => Err(serde::de::Error::custom(format!(
            "Invalid value `{}`, expected 0 or 1",
            s
        ))),
    }
}

pub fn serialize_bool<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*value))
}

#[test]
fn test_serialize_date() {
    #[derive(Serialize, Deserialize)]
    struct Test {
        #[serde(
            deserialize_with = "deserialize_date",
            serialize_with = "serialize_date"
        )]
        date: NaiveDate,
    }
    let data_in = "date\n20240108\n";
    let parsed: Test = csv::Reader::from_reader(data_in.as_bytes())
        .deserialize()
        .next()
        .unwrap()
        .unwrap();
    assert_eq!(NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(), parsed.date);

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.serialize(parsed).unwrap();
    let data_out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
    assert_eq!(data_in, data_out);
}

#[test]
fn test_invalid_date() {
    assert!(matches!(
        parse_date("2024-01-08"),
        Err(crate::Error::InvalidDate(s)) if s == "2024-01-08"
    ));
    assert!(parse_date("20240230").is_err());
}
