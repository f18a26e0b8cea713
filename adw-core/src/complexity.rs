use adw_model::ComplexityLevel;

/// Signals used to derive [`ComplexityLevel`]; each comes from a different
/// part of a [`adw_model::WorkflowRecord`] and is optional because records
/// may be scored before the child has reported all of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexitySignals {
    pub word_count: usize,
    pub duration_seconds: f64,
    pub error_count: usize,
}

/// Fixed thresholds: simple iff word_count < 50 and duration < 300s and
/// errors < 3; complex iff word_count > 200 or duration > 1800s or errors > 5;
/// otherwise medium.
pub fn classify(signals: ComplexitySignals) -> ComplexityLevel {
    let ComplexitySignals {
        word_count,
        duration_seconds,
        error_count,
    } = signals;

    if word_count > 200 || duration_seconds > 1800.0 || error_count > 5 {
        return ComplexityLevel::Complex;
    }

    if word_count < 50 && duration_seconds < 300.0 && error_count < 3 {
        return ComplexityLevel::Simple;
    }

    ComplexityLevel::Medium
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_fast_clean_input_is_simple() {
        let level = classify(ComplexitySignals {
            word_count: 10,
            duration_seconds: 60.0,
            error_count: 0,
        });
        assert_eq!(level, ComplexityLevel::Simple);
    }

    #[test]
    fn any_single_threshold_breach_makes_it_complex() {
        assert_eq!(
            classify(ComplexitySignals {
                word_count: 201,
                duration_seconds: 10.0,
                error_count: 0,
            }),
            ComplexityLevel::Complex
        );
        assert_eq!(
            classify(ComplexitySignals {
                word_count: 5,
                duration_seconds: 1801.0,
                error_count: 0,
            }),
            ComplexityLevel::Complex
        );
        assert_eq!(
            classify(ComplexitySignals {
                word_count: 5,
                duration_seconds: 1.0,
                error_count: 6,
            }),
            ComplexityLevel::Complex
        );
    }

    #[test]
    fn everything_else_is_medium() {
        let level = classify(ComplexitySignals {
            word_count: 120,
            duration_seconds: 600.0,
            error_count: 3,
        });
        assert_eq!(level, ComplexityLevel::Medium);
    }
}
