use tracing::field::{Field, Visit};
use tracing_subscriber::{
  field::RecordFields,
  fmt::{format::Writer, FormatFields},
};

/// Formats event fields, suppressing the internal `threshold` field and rendering the `critical` marker.
pub(crate) struct FieldFormatter;

impl<'writer> FormatFields<'writer> for FieldFormatter {
  fn format_fields<R: RecordFields>(&self, writer: Writer<'writer>, fields: R) -> std::fmt::Result {
    let mut visitor = FieldFilterVisitor { writer };
    fields.record(&mut visitor);
    Ok(())
  }
}

struct FieldFilterVisitor<'writer> {
  writer: Writer<'writer>,
}

impl<'writer> Visit for FieldFilterVisitor<'writer> {
  fn record_bool(&mut self, field: &Field, value: bool) {
    if field.name() == "critical" {
      if value {
        let _ = write!(self.writer, "[CRITICAL] ");
      }
    } else {
      let _ = write!(self.writer, "{}={} ", field.name(), value);
    }
  }

  fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
    match field.name() {

      "message" => {
        let _ = write!(self.writer, "{:?}", value);
      }

      "threshold" => {
        // Do not print.
      }

      name => {
        let _ = write!(self.writer, "{}={:?} ", name, value);
      }

    }
  }
}
