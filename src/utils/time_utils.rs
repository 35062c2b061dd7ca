use chrono::{Local, NaiveDate, TimeZone};

// Format used on the public pages: dd/MM/yyyy HH:mm
// chrono formatting reference:
// https://docs.rs/chrono/0.4.19/chrono/format/strftime/index.html
const DATE_FORMAT_STANDARD: &'static str = "%d/%m/%Y %H:%M";
const DATE_FORMAT_ISO: &'static str = "%Y-%m-%dT%H:%M:%S%:z";

pub enum DateFormat {
  Standard,
  Iso,
}

pub fn timestamp_to_date_string(timestamp: i64, format: DateFormat) -> String {
  let d = Local.timestamp(timestamp, 0);
  let format_str = match format {
    DateFormat::Standard => DATE_FORMAT_STANDARD,
    DateFormat::Iso => DATE_FORMAT_ISO,
  };
  d.format(format_str).to_string()
}

pub fn current_timestamp() -> i64 {
  Local::now().timestamp()
}

pub fn today() -> NaiveDate {
  Local::today().naive_local()
}

// Whole years between the two dates, the birthday counts
// on the day itself. Negative when born "after" today.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
  use chrono::Datelike;
  let mut age = today.year() - date_of_birth.year();
  if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
    age -= 1;
  }
  age
}
