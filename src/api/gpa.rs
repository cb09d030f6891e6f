//! Weighted grade-point averages. GPA covers one semester's courses, CGPA
//! the union of every semester; both round half up to two decimals.

/// The two numbers a course contributes to an average.
#[derive(Copy, Clone, Debug)]
pub struct CourseLoad {
    pub credit_unit: i64,
    pub grade_point: f64,
}

/// Round half up to two decimal places. Inputs are never negative here,
/// so half-up and half-away-from-zero coincide.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Total credit units and total weighted grade points of a course set.
pub fn totals(courses: &[CourseLoad]) -> (i64, f64) {
    let credits = courses.iter().map(|c| c.credit_unit).sum();
    let points = courses
        .iter()
        .map(|c| c.credit_unit as f64 * c.grade_point)
        .sum();
    (credits, points)
}

/// GPA of one semester's courses. An empty set, or one whose credit
/// units sum to zero, yields 0.0.
pub fn gpa(courses: &[CourseLoad]) -> f64 {
    let (credits, points) = totals(courses);
    cgpa(credits, points)
}

/// Weighted average over pre-accumulated totals; 0.0 when no credits.
pub fn cgpa(total_credits: i64, total_points: f64) -> f64 {
    if total_credits == 0 {
        return 0.0;
    }
    round2(total_points / total_credits as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(credit_unit: i64, grade_point: f64) -> CourseLoad {
        CourseLoad {
            credit_unit,
            grade_point,
        }
    }

    #[test]
    fn empty_course_set_is_zero() {
        assert_eq!(gpa(&[]), 0.0);
    }

    #[test]
    fn zero_credit_units_is_zero() {
        assert_eq!(gpa(&[course(0, 5.0), course(0, 3.0)]), 0.0);
    }

    #[test]
    fn weighted_average() {
        // (3*5.0 + 2*4.0) / 5 = 4.60
        assert_eq!(gpa(&[course(3, 5.0), course(2, 4.0)]), 4.60);
    }

    #[test]
    fn grouping_does_not_change_cgpa() {
        // semester A: 3 units at 5.0, semester B: 2 units at 3.0
        let (ca, pa) = totals(&[course(3, 5.0)]);
        let (cb, pb) = totals(&[course(2, 3.0)]);
        let grouped = cgpa(ca + cb, pa + pb);
        let flat = gpa(&[course(3, 5.0), course(2, 3.0)]);
        assert_eq!(grouped, 4.20);
        assert_eq!(grouped, flat);
    }

    #[test]
    fn rounds_half_up() {
        // (1*5.0 + 2*4.0) / 3 = 4.3333...
        assert_eq!(gpa(&[course(1, 5.0), course(2, 4.0)]), 4.33);
        // 4.125 sits exactly on the half; rounds up to 4.13
        assert_eq!(round2(4.125), 4.13);
    }

    #[test]
    fn totals_accumulate() {
        let (credits, points) = totals(&[course(3, 5.0), course(2, 4.0)]);
        assert_eq!(credits, 5);
        assert_eq!(points, 23.0);
    }
}
