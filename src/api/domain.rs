//! Fixed vocabularies used across the portal. Rows store the canonical
//! string form; incoming form values are parsed through these types so a
//! bad value is caught before anything is written.

use std::fmt;
use std::str::FromStr;

/// Academic year level, 100 through 500.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Level {
    L100,
    L200,
    L300,
    L400,
    L500,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::L100 => "100",
            Level::L200 => "200",
            Level::L300 => "300",
            Level::L400 => "400",
            Level::L500 => "500",
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "100" => Ok(Level::L100),
            "200" => Ok(Level::L200),
            "300" => Ok(Level::L300),
            "400" => Ok(Level::L400),
            "500" => Ok(Level::L500),
            other => Err(format!("unknown level: {other}")),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First or second half of an academic session.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SemesterPeriod {
    First,
    Second,
}

impl SemesterPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemesterPeriod::First => "First",
            SemesterPeriod::Second => "Second",
        }
    }
}

impl FromStr for SemesterPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "First" => Ok(SemesterPeriod::First),
            "Second" => Ok(SemesterPeriod::Second),
            other => Err(format!("unknown semester: {other}")),
        }
    }
}

/// The departmental grade scale. Each grade carries a fixed point value;
/// course rows store the numeric form.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    pub fn points(&self) -> f64 {
        match self {
            Grade::A => 5.0,
            Grade::B => 4.0,
            Grade::C => 3.0,
            Grade::D => 2.0,
            Grade::E => 1.0,
            Grade::F => 0.0,
        }
    }

    pub fn letter(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
        }
    }

    /// Maps a stored point value back onto the scale.
    pub fn from_points(points: f64) -> Option<Self> {
        [Grade::A, Grade::B, Grade::C, Grade::D, Grade::E, Grade::F]
            .into_iter()
            .find(|g| g.points() == points)
    }

    /// Letter shown on result breakdowns for an arbitrary stored value.
    pub fn letter_for(points: f64) -> &'static str {
        Grade::from_points(points).map_or("N/A", |g| g.letter())
    }
}

/// Library resource categories.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResourceCategory {
    Textbook,
    Journal,
    Lecture,
    Project,
    Thesis,
    Other,
}

impl ResourceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::Textbook => "Textbook",
            ResourceCategory::Journal => "Journal",
            ResourceCategory::Lecture => "Lecture",
            ResourceCategory::Project => "Project",
            ResourceCategory::Thesis => "Thesis",
            ResourceCategory::Other => "Other",
        }
    }
}

impl FromStr for ResourceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Textbook" => Ok(ResourceCategory::Textbook),
            "Journal" => Ok(ResourceCategory::Journal),
            "Lecture" => Ok(ResourceCategory::Lecture),
            "Project" => Ok(ResourceCategory::Project),
            "Thesis" => Ok(ResourceCategory::Thesis),
            "Other" => Ok(ResourceCategory::Other),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Handbook course classification.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CourseType {
    Core,
    Required,
    Elective,
}

impl CourseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseType::Core => "Core",
            CourseType::Required => "Required",
            CourseType::Elective => "Elective",
        }
    }
}

impl FromStr for CourseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Core" => Ok(CourseType::Core),
            "Required" => Ok(CourseType::Required),
            "Elective" => Ok(CourseType::Elective),
            other => Err(format!("unknown course type: {other}")),
        }
    }
}

/// Examination or class timetable.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimetableKind {
    Exam,
    Class,
}

impl TimetableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimetableKind::Exam => "Exam",
            TimetableKind::Class => "Class",
        }
    }
}

impl FromStr for TimetableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Exam" => Ok(TimetableKind::Exam),
            "Class" => Ok(TimetableKind::Class),
            other => Err(format!("unknown timetable type: {other}")),
        }
    }
}

/// Timetable audience: a single level, or every level at once.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimetableLevel {
    All,
    Only(Level),
}

impl TimetableLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimetableLevel::All => "All",
            TimetableLevel::Only(level) => level.as_str(),
        }
    }
}

impl FromStr for TimetableLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "All" {
            return Ok(TimetableLevel::All);
        }
        s.parse().map(TimetableLevel::Only)
    }
}
