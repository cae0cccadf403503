use serde::{
  Deserialize,
  Serialize
};

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkType {
  Royal,
  Vas,
  Support
}

impl WorkType {
  pub fn display_name(
    self
  ) -> &'static str {
    match self {
      | Self::Royal => "Lịch dạy Royal",
      | Self::Vas => "Sự kiện hè VAS",
      | Self::Support => {
        "Hỗ trợ/trợ giảng"
      }
    }
  }

  pub fn color(self) -> &'static str {
    match self {
      | Self::Royal => "#FFA500",
      | Self::Vas => "#0066CC",
      | Self::Support => "#00AA00"
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
  Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
  #[default]
  NotMarked,
  Present,
  Absent
}

impl AttendanceStatus {
  pub fn display_name(
    self
  ) -> &'static str {
    match self {
      | Self::NotMarked => "Chưa chấm",
      | Self::Present => "Có mặt",
      | Self::Absent => "Vắng mặt"
    }
  }
}

/// One work-schedule entry as served by
/// the teacher-management API.
///
/// Times stay as the raw strings the
/// backend sent; they are validated when
/// a block is laid out so one bad record
/// never poisons the rest of the week.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct WorkScheduleDto {
  pub id:                        i64,
  pub teacher_id:                Option<i64>,
  #[serde(default)]
  pub teacher_name:              String,
  pub work_date:                 String,
  pub start_time:                String,
  pub end_time:                  String,
  pub work_type:                 Option<WorkType>,
  #[serde(default)]
  pub work_type_display:         String,
  #[serde(default)]
  pub work_type_color:           String,
  pub location:                  Option<String>,
  #[serde(default)]
  pub content:                   String,
  pub notes:                     Option<String>,
  #[serde(default)]
  pub attendance_status:         AttendanceStatus,
  #[serde(default)]
  pub attendance_status_display: String,
  pub attendance_notes:          Option<String>,
  pub created_at:                Option<String>,
  pub updated_at:                Option<String>,
  pub created_by:                Option<i64>,
  pub duration:                  Option<f64>
}

impl WorkScheduleDto {
  /// Colour used for the calendar
  /// block, falling back to the work
  /// type's palette entry.
  pub fn display_color(&self) -> String {
    if !self
      .work_type_color
      .trim()
      .is_empty()
    {
      return self
        .work_type_color
        .clone();
    }

    self
      .work_type
      .map(|kind| kind.color())
      .unwrap_or("#7f8691")
      .to_string()
  }
}

/// Envelope every API endpoint wraps its
/// payload in.
#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct ApiResponse<T> {
  #[serde(default)]
  pub success: bool,
  pub message: Option<String>,
  pub data:    Option<T>
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decodes_api_payload() {
    let raw = r##"{
      "success": true,
      "message": null,
      "data": [{
        "id": 7,
        "teacherId": 3,
        "teacherName": "Lan",
        "workDate": "2026-10-20",
        "startTime": "07:30",
        "endTime": "11:30",
        "workType": "ROYAL",
        "workTypeDisplay": "Lịch dạy Royal",
        "workTypeColor": "#FFA500",
        "content": "Grade 3",
        "attendanceStatus": "PRESENT",
        "duration": 4.0
      }]
    }"##;

    let parsed: ApiResponse<
      Vec<WorkScheduleDto>
    > = serde_json::from_str(raw)
      .expect("decode payload");
    let records =
      parsed.data.expect("data");

    assert!(parsed.success);
    assert_eq!(records.len(), 1);
    assert_eq!(
      records[0].work_type,
      Some(WorkType::Royal)
    );
    assert_eq!(
      records[0].attendance_status,
      AttendanceStatus::Present
    );
    assert_eq!(records[0].location, None);
  }

  #[test]
  fn falls_back_to_work_type_color() {
    let record: WorkScheduleDto =
      serde_json::from_str(
        r#"{"id":1,"workDate":"2026-10-20","startTime":"08:00","endTime":"09:00","workType":"VAS"}"#
      )
      .expect("decode record");

    assert_eq!(
      record.attendance_status,
      AttendanceStatus::NotMarked
    );
    assert_eq!(
      record.display_color(),
      "#0066CC"
    );
  }
}
