use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

/// All the objects type from the GTFS specification that this library reads
#[derive(Debug, Serialize, Eq, PartialEq, Hash, Clone, Copy)]
pub enum ObjectType {
    /// [Calendar] <https://gtfs.org/reference/static/#calendartxt>
    Calendar,
    /// [CalendarDate] <https://gtfs.org/reference/static/#calendar_datestxt>
    CalendarDate,
}

impl ObjectType {
    /// Name of the file holding this kind of objects in a feed
    pub fn file_name(&self) -> &'static str {
        match self {
            ObjectType::Calendar => "calendar.txt",
            ObjectType::CalendarDate => "calendar_dates.txt",
        }
    }
}

fn serialize_i32_as_str<S: Serializer>(s: S, value: i32) -> Result<S::Ok, S::Error> {
    s.serialize_str(&value.to_string())
}

/// Defines if a [CalendarDate] is added or deleted from a [Calendar]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Exception {
    /// There will be a service on that day
    Added,
    /// There won’t be a service on that day
    Deleted,
    /// An unknown value not in the specification
    Unknown(i32),
}

impl Exception {
    /// The integer code used in `calendar_dates.txt`
    pub fn code(&self) -> i32 {
        match self {
            Exception::Added => 1,
            Exception::Deleted => 2,
            Exception::Unknown(i) => *i,
        }
    }
}

impl From<i32> for Exception {
    fn from(code: i32) -> Self {
        match code {
            1 => Exception::Added,
            2 => Exception::Deleted,
            i => Exception::Unknown(i),
        }
    }
}

impl<'de> Deserialize<'de> for Exception {
    fn deserialize<D>(deserializer: D) -> Result<Exception, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = String::deserialize(deserializer)?;
        s.parse::<i32>().map(Exception::from).map_err(|_| {
            serde::de::Error::custom(format!(
                "invalid value for exception_type, must be an integer: {}",
                s
            ))
        })
    }
}

impl Serialize for Exception {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize_i32_as_str(serializer, self.code())
    }
}
