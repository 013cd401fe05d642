use ratatui::style::Color;

/// Three-tier classification of a 0-10 resume rating. Every view that shows a
/// rating goes through [`severity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Favorable,
    Borderline,
    Unfavorable,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Favorable => "favorable",
            Severity::Borderline => "borderline",
            Severity::Unfavorable => "unfavorable",
        }
    }

    pub fn color(self) -> Color {
        match self {
            Severity::Favorable => Color::Green,
            Severity::Borderline => Color::Yellow,
            Severity::Unfavorable => Color::Red,
        }
    }
}

pub fn severity(rating: f64) -> Severity {
    if rating >= 7.0 {
        Severity::Favorable
    } else if rating >= 5.0 {
        Severity::Borderline
    } else {
        // NaN lands here too
        Severity::Unfavorable
    }
}

/// Chip text: `8/10`, `7.5/10`, or `-/10` when the analysis has no rating.
/// The value is never rounded, so the label always agrees with [`severity`].
pub fn rating_label(rating: Option<f64>) -> String {
    match rating {
        Some(r) if r.is_finite() => format!("{}/10", r),
        _ => "-/10".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_boundaries() {
        assert_eq!(severity(10.0), Severity::Favorable);
        assert_eq!(severity(7.0), Severity::Favorable);
        assert_eq!(severity(6.99), Severity::Borderline);
        assert_eq!(severity(5.0), Severity::Borderline);
        assert_eq!(severity(4.99), Severity::Unfavorable);
        assert_eq!(severity(0.0), Severity::Unfavorable);
        assert_eq!(severity(f64::NAN), Severity::Unfavorable);
    }

    #[test]
    fn test_severity_matches_ranges_across_scale() {
        for tenth in 0..=100 {
            let r = tenth as f64 / 10.0;
            let expected = if r >= 7.0 {
                Severity::Favorable
            } else if r >= 5.0 {
                Severity::Borderline
            } else {
                Severity::Unfavorable
            };
            assert_eq!(severity(r), expected, "rating {r}");
        }
    }

    #[test]
    fn test_rating_label() {
        assert_eq!(rating_label(Some(8.0)), "8/10");
        assert_eq!(rating_label(Some(7.5)), "7.5/10");
        assert_eq!(rating_label(None), "-/10");
        assert_eq!(rating_label(Some(f64::INFINITY)), "-/10");
    }

    #[test]
    fn test_rating_label_never_crosses_a_threshold() {
        assert_eq!(rating_label(Some(6.95)), "6.95/10");
        assert_eq!(severity(6.95), Severity::Borderline);
        assert_eq!(rating_label(Some(4.96)), "4.96/10");
        assert_eq!(severity(4.96), Severity::Unfavorable);
        assert_eq!(rating_label(Some(0.0)), "0/10");
    }

    #[test]
    fn test_severity_colors_are_distinct() {
        assert_eq!(Severity::Favorable.color(), Color::Green);
        assert_eq!(Severity::Borderline.color(), Color::Yellow);
        assert_eq!(Severity::Unfavorable.color(), Color::Red);
        assert_eq!(Severity::Borderline.label(), "borderline");
    }
}
