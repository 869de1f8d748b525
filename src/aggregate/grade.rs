/// Grades an average utilization score by how far it reaches toward `goal`.
///
/// | Share of goal | Grade |
/// |---------------|-------|
/// | >= 120%       | A+    |
/// | >= 100%       | A     |
/// | >= 85%        | B     |
/// | >= 70%        | C     |
/// | >= 50%        | D     |
/// | < 50%         | F     |
///
/// A goal of zero is met by any score.
pub fn grade(utilization: f64, goal: f64) -> &'static str {
    if goal <= 0.0 {
        return "A";
    }
    match utilization / goal {
        r if r >= 1.2 => "A+",
        r if r >= 1.0 => "A",
        r if r >= 0.85 => "B",
        r if r >= 0.7 => "C",
        r if r >= 0.5 => "D",
        _ => "F",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_against_goal() {
        assert_eq!(grade(0.60, 0.6), "A");
        assert_eq!(grade(0.80, 0.6), "A+");
        assert_eq!(grade(0.55, 0.6), "B");
        assert_eq!(grade(0.45, 0.6), "C");
        assert_eq!(grade(0.35, 0.6), "D");
        assert_eq!(grade(0.25, 0.6), "F");
    }

    #[test]
    fn test_scores_above_one_are_graded() {
        // utilization has no upper bound; a goal above 1 still spreads grades
        assert_eq!(grade(1.4, 1.5), "B");
        assert_eq!(grade(1.6, 1.5), "A");
        assert_eq!(grade(0.5, 1.5), "F");
    }

    #[test]
    fn test_zero_goal_is_always_met() {
        assert_eq!(grade(0.0, 0.0), "A");
    }
}
