use sound_level_core::LoudnessReading;

const METER_WIDTH: usize = 40;
const METER_FULL_SCALE: f32 = 100.0;

/// One-line live meter, e.g. `  63.41 dB [#########################       ]`.
pub fn meter_line(reading: LoudnessReading, loud_threshold: f32) -> String {
    let filled = ((reading.value() / METER_FULL_SCALE).clamp(0.0, 1.0) * METER_WIDTH as f32)
        .round() as usize;
    let marker = if reading.is_loud(loud_threshold) {
        " LOUD"
    } else {
        ""
    };
    format!(
        "{:>7.2} dB [{}{}]{}",
        reading.value(),
        "#".repeat(filled),
        " ".repeat(METER_WIDTH - filled),
        marker
    )
}
