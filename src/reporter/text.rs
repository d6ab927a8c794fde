use crate::store::{EntityStore, PlacementRow};
use crate::types::{ClassroomId, SolveOutcome, SolveStatus, StudentId, TeacherId};
use colored::Colorize;
use itertools::Itertools;

/// Print a colored terminal summary of a solve outcome
pub fn print_summary(outcome: &SolveOutcome) {
    let report = &outcome.report;
    let status = match report.status {
        SolveStatus::Solved => "SOLVED".green().bold(),
        SolveStatus::Unsolvable => "UNSOLVABLE".red().bold(),
        SolveStatus::Cancelled => "CANCELLED".yellow().bold(),
        SolveStatus::Timeout => "TIMEOUT".yellow().bold(),
    };
    println!("\n{} {}", "Status:".bold(), status);
    println!(
        "  {}/{} class-periods assigned",
        report.assigned, report.variables
    );
    println!(
        "  {} assigns, {} backtracks, {} ms",
        report.assigns, report.backtracks, report.elapsed_ms
    );
    if report.status == SolveStatus::Solved {
        println!("  {} placements committed", outcome.placements.len());
    } else if report.assigned > 0 {
        println!(
            "  {}",
            "partial assignment reported, nothing committed".yellow()
        );
    }
}

/// Plain-text version of the summary for report files
pub fn summary_text(outcome: &SolveOutcome) -> String {
    let report = &outcome.report;
    format!(
        "status: {}\nclass-periods: {}/{}\nassigns: {}\nbacktracks: {}\nelapsed_ms: {}\nplacements: {}\n",
        report.status,
        report.assigned,
        report.variables,
        report.assigns,
        report.backtracks,
        report.elapsed_ms,
        outcome.placements.len()
    )
}

fn render_rows(title: &str, store: &EntityStore, rows: &[PlacementRow]) -> String {
    let body = rows
        .iter()
        .map(|row| {
            let period = store
                .period(row.period)
                .map(|p| p.to_string())
                .unwrap_or_else(|| format!("P{}", row.period));
            format!(
                "{period:<8} {:<12} {:<4} {:<6} {}",
                row.class_name, row.subject_code, row.teacher_code, row.room_name
            )
        })
        .join("\n");
    format!("{title}\n{}\n{body}\n", "-".repeat(title.len()))
}

/// A teacher's committed timetable as text, if the teacher exists
pub fn teacher_timetable(store: &EntityStore, teacher: TeacherId) -> Option<String> {
    let teacher = store.teacher(teacher)?;
    let rows = store.placements_for_teacher(teacher.id);
    Some(render_rows(
        &format!("Timetable for {} ({})", teacher.name, teacher.code),
        store,
        &rows,
    ))
}

/// A student's committed timetable as text, if the student exists
pub fn student_timetable(store: &EntityStore, student: StudentId) -> Option<String> {
    let student = store.student(student)?;
    let rows = store.placements_for_student(student.id);
    Some(render_rows(
        &format!("Timetable for {}", student.name),
        store,
        &rows,
    ))
}

/// A room's committed timetable as text, if the room exists
pub fn room_timetable(store: &EntityStore, room: ClassroomId) -> Option<String> {
    let room = store.classroom(room)?;
    let rows = store.placements_for_room(room.id);
    Some(render_rows(
        &format!("Timetable for room {}", room.name),
        store,
        &rows,
    ))
}
