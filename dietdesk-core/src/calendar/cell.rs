use chrono::Datelike;
use std::collections::BTreeMap;
use std::fmt;

use crate::date_key::{CalendarMonth, DateKey};
use crate::models::{MealPlan, PlanId};

/// What a day shows. `Selected` wins over `Assigned` so a removal selection
/// stays visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellState {
    Available,
    Selected,
    Assigned(PlanId),
}

/// One rendered day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCell {
    pub key: DateKey,
    pub state: CellState,
    /// Plan holding the day, even while it is selected.
    pub plan: Option<PlanId>,
    pub plan_name: Option<String>,
    /// Before today: still viewable, not offered for assignment.
    pub past: bool,
    pub today: bool,
}

impl CalendarCell {
    pub fn is_assigned(&self) -> bool {
        self.plan.is_some()
    }

    /// Free, not in the past, so a plan can be put on it.
    pub fn accepts_assignment(&self) -> bool {
        self.plan.is_none() && !self.past
    }

    fn marker(&self) -> char {
        match self.state {
            CellState::Selected => '+',
            CellState::Assigned(_) => '*',
            CellState::Available if self.past => '.',
            CellState::Available => ' ',
        }
    }
}

/// A month laid out in Monday-first weeks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthView {
    pub month: CalendarMonth,
    pub cells: Vec<CalendarCell>,
}

impl MonthView {
    /// Rows of seven; days outside the month are `None`.
    pub fn weeks(&self) -> Vec<[Option<&CalendarCell>; 7]> {
        let mut weeks = Vec::new();
        let mut week: [Option<&CalendarCell>; 7] = [None; 7];
        for cell in &self.cells {
            let column = cell.key.to_date().weekday().num_days_from_monday() as usize;
            week[column] = Some(cell);
            if column == 6 {
                weeks.push(week);
                week = [None; 7];
            }
        }
        if week.iter().any(Option::is_some) {
            weeks.push(week);
        }
        weeks
    }

    pub fn cell(&self, key: DateKey) -> Option<&CalendarCell> {
        self.cells.iter().find(|c| c.key == key)
    }

    /// Plans shown this month with the days they hold.
    pub fn legend(&self) -> BTreeMap<String, Vec<u32>> {
        let mut legend: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        for cell in &self.cells {
            if let Some(name) = &cell.plan_name {
                legend
                    .entry(name.clone())
                    .or_default()
                    .push(cell.key.to_date().day());
            }
        }
        legend
    }
}

impl fmt::Display for MonthView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self.month.first_day().to_date().format("%B %Y").to_string();
        writeln!(f, "{}", title)?;
        writeln!(f, "{}", "=".repeat(title.len()))?;
        writeln!(f, " Mo   Tu   We   Th   Fr   Sa   Su")?;

        for week in self.weeks() {
            let row: Vec<String> = week
                .iter()
                .map(|cell| match cell {
                    Some(c) => format!(
                        "{:>3}{}{}",
                        c.key.to_date().day(),
                        c.marker(),
                        if c.today { '<' } else { ' ' }
                    ),
                    None => "     ".to_string(),
                })
                .collect();
            writeln!(f, "{}", row.join("").trim_end())?;
        }

        let legend = self.legend();
        if !legend.is_empty() {
            writeln!(f)?;
            for (name, days) in legend {
                let days: Vec<String> = days.iter().map(ToString::to_string).collect();
                writeln!(f, "* {}: {}", name, days.join(", "))?;
            }
        }
        Ok(())
    }
}

/// Read-only view of the plan on a given day.
#[derive(Debug, Clone, Copy)]
pub struct PlanDetail<'a> {
    pub date: DateKey,
    pub plan: &'a MealPlan,
}

impl fmt::Display for PlanDetail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.date)?;
        writeln!(f)?;
        write!(f, "{}", self.plan)?;
        writeln!(
            f,
            "\nScheduled on {} day(s)",
            self.plan.assigned_dates.len()
        )
    }
}
