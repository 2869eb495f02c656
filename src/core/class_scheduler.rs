//! Weekly class timetables. Elective baskets go first, then courses taught
//! jointly in an auditorium, then every remaining course per section. Each
//! component is placed greedily: a random day, shuffled start slots, the
//! first start that satisfies every constraint wins.

use crate::config::schedule_config::{BreakWindows, ScheduleConfig};
use crate::domain::model::{
    Booking, Cell, Course, ElectiveBasket, ElectiveSeat, Room, RoomKind, SectionTimetable,
    SessionKind, TimeSlot, UnscheduledCourse,
};
use crate::ingest::class_inputs::{ClassInputs, COURSES_FILE};
use crate::utils::error::{Result, TimetableError};
use crate::utils::validation::Validate;
use chrono::{NaiveTime, Timelike};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

pub const TBD: &str = "TBD";
pub const MULTIPLE_FACULTY: &str = "Multiple Faculty";

const MIN_PROFESSOR_GAP_MIN: i64 = 180;
const JOINT_ATTEMPTS: usize = 2000;
const AUDITORIUM_LAB_ROOMS: usize = 2;
const DEFAULT_CLASS_SIZE: u32 = 60;
const BASKET_FAILURE: &str = "Basket slot not found";

/// How a grid column is treated regardless of what is booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotMark {
    Open,
    Minor,
    Break,
}

/// Morning and lunch windows break every kind; the afternoon window only
/// breaks lectures and tutorials.
pub fn is_break_slot(slot: &TimeSlot, kind: Option<SessionKind>, breaks: &BreakWindows) -> bool {
    let hits = |(start, end): (NaiveTime, NaiveTime)| slot.overlaps(start, end);
    if hits(breaks.morning) || hits(breaks.lunch) {
        return true;
    }
    matches!(kind, Some(SessionKind::Lecture | SessionKind::Tutorial)) && hits(breaks.lecture_tutorial)
}

pub fn is_minor_slot(slot: &TimeSlot) -> bool {
    let start = (slot.start.hour(), slot.start.minute());
    let end = (slot.end.hour(), slot.end.minute());
    (start == (7, 30) && end == (9, 0)) || start == (18, 30)
}

pub fn is_lecture_unfriendly(slot: &TimeSlot) -> bool {
    (slot.start.hour(), slot.start.minute()) >= (17, 30)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionPlan {
    pub lectures: u32,
    pub tutorials: u32,
    pub labs: u32,
    pub self_study: u32,
    pub lab_minutes: u32,
}

impl SessionPlan {
    /// Every session to place with its length in minutes, lectures first.
    pub fn components(&self, config: &ScheduleConfig) -> Vec<(SessionKind, u32)> {
        let repeat = |kind, count: u32, minutes| (0..count).map(move |_| (kind, minutes));
        repeat(SessionKind::Lecture, self.lectures, config.lecture_min)
            .chain(repeat(SessionKind::Tutorial, self.tutorials, config.tutorial_min))
            .chain(repeat(SessionKind::Lab, self.labs, self.lab_minutes))
            .chain(repeat(SessionKind::SelfStudy, self.self_study, config.self_study_min))
            .collect()
    }
}

pub fn required_sessions(course: &Course, config: &ScheduleConfig) -> SessionPlan {
    let sessions = |hours: u32, minutes: u32| {
        if hours == 0 || minutes == 0 {
            0
        } else {
            (hours * 60).div_ceil(minutes)
        }
    };
    SessionPlan {
        lectures: sessions(course.lecture_hours, config.lecture_min),
        tutorials: sessions(course.tutorial_hours, config.tutorial_min),
        labs: u32::from(course.lab_hours > 0),
        self_study: sessions(course.self_study_hours, config.self_study_min),
        lab_minutes: course.lab_hours * 60,
    }
}

/// `A & B` splits by section; otherwise the first of a `/`, `,` or `;` list.
pub fn select_faculty(field: &str, section: char) -> String {
    let field = field.trim();
    if crate::ingest::is_blank(field) {
        return TBD.to_string();
    }

    if field.contains('&') {
        let names: Vec<&str> = field.split('&').map(str::trim).filter(|n| !n.is_empty()).collect();
        let pick = match names.as_slice() {
            [_, second, ..] if section.eq_ignore_ascii_case(&'B') => *second,
            [first, ..] => *first,
            [] => TBD,
        };
        return pick.to_string();
    }

    for separator in ['/', ',', ';'] {
        if let Some((first, _)) = field.split_once(separator) {
            return first.trim().to_string();
        }
    }
    field.to_string()
}

/// Every name in a faculty field, split on the first separator present.
pub fn split_faculty_names(field: &str) -> Vec<String> {
    let field = field.trim();
    if crate::ingest::is_blank(field) {
        return Vec::new();
    }
    for separator in ['/', ',', '&', ';'] {
        if field.contains(separator) {
            return crate::ingest::split_list(field, separator);
        }
    }
    vec![field.to_string()]
}

/// Lab courses ahead of the rest, then electives first and higher priority
/// first (stable), duplicates dropped.
pub fn order_courses(courses: Vec<&Course>) -> Vec<&Course> {
    let by_priority = |a: &&Course, b: &&Course| b.priority().cmp(&a.priority());
    let (mut ordered, mut rest): (Vec<&Course>, Vec<&Course>) =
        courses.into_iter().partition(|c| c.has_lab());
    ordered.sort_by(by_priority);
    rest.sort_by(by_priority);
    ordered.extend(rest);
    ordered.sort_by(|a, b| {
        b.is_elective()
            .cmp(&a.is_elective())
            .then_with(|| b.priority().cmp(&a.priority()))
    });

    let mut unique: Vec<&Course> = Vec::with_capacity(ordered.len());
    for course in ordered {
        if !unique.contains(&course) {
            unique.push(course);
        }
    }
    unique
}

fn joined(pools: &[&Vec<String>]) -> Vec<String> {
    pools.iter().flat_map(|p| p.iter().cloned()).collect()
}

#[derive(Debug, Clone, Default)]
struct RoomPools {
    lecture: Vec<String>,
    labs: Vec<String>,
    auditoria: Vec<String>,
    small: Vec<String>,
    medium: Vec<String>,
    large: Vec<String>,
}

impl RoomPools {
    fn new(rooms: &[Room]) -> Self {
        let mut pools = Self::default();
        for room in rooms {
            let number = room.number.clone();
            match room.kind {
                RoomKind::LectureRoom => {
                    pools.lecture.push(number.clone());
                    match room.capacity {
                        c if c < 60 => pools.small.push(number),
                        c if c <= 120 => pools.medium.push(number),
                        _ => pools.large.push(number),
                    }
                }
                RoomKind::ComputerLab => pools.labs.push(number),
                RoomKind::Seater120 => pools.large.push(number),
                RoomKind::Seater240 => pools.auditoria.push(number),
            }
        }
        pools
    }

    fn has_kind(&self, kind: RoomKind) -> bool {
        match kind {
            RoomKind::ComputerLab => !self.labs.is_empty(),
            RoomKind::Seater240 => !self.auditoria.is_empty(),
            _ => !self.lecture.is_empty() || !self.large.is_empty(),
        }
    }

    fn candidates(&self, kind: RoomKind, capacity: u32) -> Vec<String> {
        let pool = match kind {
            RoomKind::ComputerLab => return self.labs.clone(),
            RoomKind::Seater240 => return self.auditoria.clone(),
            _ if capacity > 120 => joined(&[&self.large, &self.auditoria]),
            _ if capacity > 60 => joined(&[&self.medium, &self.large]),
            _ => joined(&[&self.small, &self.medium, &self.large]),
        };
        if pool.is_empty() {
            self.lecture.clone()
        } else {
            pool
        }
    }

    /// Large rooms first, then lecture rooms, each once.
    fn basket_pool(&self) -> Vec<String> {
        let mut pool: Vec<String> = Vec::with_capacity(self.large.len() + self.lecture.len());
        for room in self.large.iter().chain(self.lecture.iter()) {
            if !pool.contains(room) {
                pool.push(room.clone());
            }
        }
        pool
    }
}

/// One basket session written into every section that takes the basket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketSession {
    pub kind: SessionKind,
    pub day: usize,
    pub slots: Vec<usize>,
    pub seats: Vec<ElectiveSeat>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketSchedule {
    pub semester: u32,
    pub label: String,
    pub departments: Vec<String>,
    pub sessions: Vec<BasketSession>,
}

/// Occupied slot indices of one room, per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomUsage {
    pub room: String,
    pub kind: RoomKind,
    pub busy: Vec<Vec<usize>>,
}

/// Everything one generation produced. Persisted as JSON; the reports in
/// `class_reports` are rendered from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTimetable {
    pub days: Vec<String>,
    pub slots: Vec<TimeSlot>,
    pub marks: Vec<SlotMark>,
    pub sections: Vec<SectionTimetable>,
    pub baskets: Vec<BasketSchedule>,
    pub electives: Vec<ElectiveBasket>,
    pub rooms: Vec<RoomUsage>,
    pub unscheduled: Vec<UnscheduledCourse>,
    pub generated_at: String,
}

impl ClassTimetable {
    pub fn section(&self, title: &str) -> Option<&SectionTimetable> {
        self.sections.iter().find(|s| s.title() == title)
    }

    pub fn section_titles(&self) -> Vec<String> {
        self.sections.iter().map(SectionTimetable::title).collect()
    }
}

/// All sections of one department and semester.
#[derive(Debug, Clone)]
struct SectionGroup {
    department: String,
    semester: u32,
    sections: Vec<SectionTimetable>,
}

type Week = Vec<BTreeSet<usize>>;

struct Scheduler<'a> {
    config: &'a ScheduleConfig,
    slots: Vec<TimeSlot>,
    breaks: BreakWindows,
    days: usize,
    rng: StdRng,
    pools: RoomPools,
    groups: Vec<SectionGroup>,
    room_busy: HashMap<String, Week>,
    professor_busy: HashMap<String, Week>,
    // (course code, room kind) -> the room that course keeps
    course_rooms: HashMap<(String, RoomKind), String>,
    baskets: Vec<BasketSchedule>,
    unscheduled: Vec<UnscheduledCourse>,
}

fn tracks_professor(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && !name.eq_ignore_ascii_case(TBD) && !name.eq_ignore_ascii_case(MULTIPLE_FACULTY)
}

/// Same day and either a shared slot or directly adjacent runs.
fn clashes_with_baskets(day: usize, slots: &[usize], taken: &[BasketSession]) -> bool {
    taken.iter().filter(|t| t.day == day).any(|t| {
        if slots.iter().any(|s| t.slots.contains(s)) {
            return true;
        }
        match (slots.first(), slots.last(), t.slots.first(), t.slots.last()) {
            (Some(&lo), Some(&hi), Some(&other_lo), Some(&other_hi)) => {
                lo.abs_diff(other_hi) == 1 || hi.abs_diff(other_lo) == 1
            }
            _ => false,
        }
    })
}

impl<'a> Scheduler<'a> {
    fn new(inputs: &ClassInputs, config: &'a ScheduleConfig) -> Result<Self> {
        let slots = config.time_slots();
        let breaks = config.breaks()?;
        let days = config.days.len();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        // departments keep their first-appearance order
        let mut departments: Vec<&str> = Vec::new();
        for course in &inputs.courses {
            if !departments.contains(&course.department.as_str()) {
                departments.push(&course.department);
            }
        }

        let mut groups = Vec::new();
        for department in departments {
            let semesters: BTreeSet<u32> = inputs
                .courses
                .iter()
                .filter(|c| c.department == department)
                .map(|c| c.semester)
                .collect();
            for semester in semesters {
                let split = config.is_split(department, semester);
                let letters: &[char] = if split { &['A', 'B'] } else { &['A'] };
                groups.push(SectionGroup {
                    department: department.to_string(),
                    semester,
                    sections: letters
                        .iter()
                        .map(|&letter| {
                            SectionTimetable::new(department, semester, letter, split, days, slots.len())
                        })
                        .collect(),
                });
            }
        }

        Ok(Self {
            config,
            slots,
            breaks,
            days,
            rng,
            pools: RoomPools::new(&inputs.rooms),
            groups,
            room_busy: HashMap::new(),
            professor_busy: HashMap::new(),
            course_rooms: HashMap::new(),
            baskets: Vec::new(),
            unscheduled: Vec::new(),
        })
    }

    fn random_day(&mut self) -> usize {
        self.rng.gen_range(0..self.days)
    }

    fn shuffled_starts(&mut self, kind: SessionKind) -> Vec<usize> {
        let mut starts: Vec<usize> = (0..self.slots.len()).collect();
        starts.shuffle(&mut self.rng);
        if kind == SessionKind::Lecture {
            starts.retain(|&i| !is_lecture_unfriendly(&self.slots[i]));
        }
        starts
    }

    fn room_free(&self, room: &str, day: usize, slots: &[usize]) -> bool {
        self.room_busy
            .get(room)
            .map(|week| slots.iter().all(|s| !week[day].contains(s)))
            .unwrap_or(true)
    }

    fn mark_room(&mut self, room: &str, day: usize, slots: &[usize]) {
        let days = self.days;
        let week = self
            .room_busy
            .entry(room.to_string())
            .or_insert_with(|| vec![BTreeSet::new(); days]);
        week[day].extend(slots.iter().copied());
    }

    /// Not teaching in any of `slots`, and every other start that day is at
    /// least three hours away from the first of them.
    fn professor_free(&self, faculty: &str, day: usize, slots: &[usize]) -> bool {
        if !tracks_professor(faculty) {
            return true;
        }
        let Some(week) = self.professor_busy.get(faculty) else {
            return true;
        };
        let busy = &week[day];
        if slots.iter().any(|s| busy.contains(s)) {
            return false;
        }
        let Some(&first) = slots.first() else {
            return true;
        };
        let start = self.slots[first].start;
        busy.iter()
            .all(|&s| (self.slots[s].start - start).num_minutes().abs() >= MIN_PROFESSOR_GAP_MIN)
    }

    fn mark_professor(&mut self, faculty: &str, day: usize, slots: &[usize]) {
        if !tracks_professor(faculty) {
            return;
        }
        let days = self.days;
        let week = self
            .professor_busy
            .entry(faculty.trim().to_string())
            .or_insert_with(|| vec![BTreeSet::new(); days]);
        week[day].extend(slots.iter().copied());
    }

    /// Slots from `start` covering `minutes` in one section, or None when a
    /// minor slot, a break or a booked cell gets in the way.
    fn consecutive_slots(
        &self,
        group: usize,
        section: usize,
        day: usize,
        start: usize,
        minutes: u32,
        kind: SessionKind,
    ) -> Option<Vec<usize>> {
        let grid = &self.groups[group].sections[section];
        let needed = i64::from(minutes);
        let mut picked = Vec::new();
        let mut total = 0;
        let mut i = start;

        while i < self.slots.len() && total < needed {
            let slot = &self.slots[i];
            if is_minor_slot(slot) || is_break_slot(slot, Some(kind), &self.breaks) || !grid.is_free(day, i) {
                return None;
            }
            picked.push(i);
            total += slot.minutes();
            i += 1;
        }

        (total >= needed && !picked.is_empty()).then_some(picked)
    }

    /// The same run must be open in every section of every group.
    fn joint_slots(
        &self,
        groups: &[usize],
        day: usize,
        start: usize,
        minutes: u32,
        kind: SessionKind,
    ) -> Option<Vec<usize>> {
        let mut common = None;
        for &g in groups {
            for s in 0..self.groups[g].sections.len() {
                let slots = self.consecutive_slots(g, s, day, start, minutes, kind)?;
                common.get_or_insert(slots);
            }
        }
        common
    }

    fn find_room(
        &mut self,
        code: &str,
        kind: RoomKind,
        capacity: u32,
        day: usize,
        slots: &[usize],
    ) -> Option<String> {
        let key = (code.to_string(), kind);
        if let Some(room) = self.course_rooms.get(&key) {
            return self.room_free(room, day, slots).then(|| room.clone());
        }

        let mut pool = self.pools.candidates(kind, capacity);
        pool.shuffle(&mut self.rng);
        let room = pool.into_iter().find(|r| self.room_free(r, day, slots))?;
        self.course_rooms.insert(key, room.clone());
        Some(room)
    }

    /// A lecture may not share a day with another lecture or a tutorial of
    /// the same course.
    fn component_conflict(&self, group: usize, section: usize, day: usize, code: &str, kind: SessionKind) -> bool {
        use SessionKind::{Lecture, Tutorial};
        if !matches!(kind, Lecture | Tutorial) {
            return false;
        }
        self.groups[group].sections[section].cells[day]
            .iter()
            .filter_map(Cell::booking)
            .filter(|b| b.basket.is_none() && b.code == code)
            .any(|b| matches!((kind, b.kind), (Lecture, Lecture) | (Lecture, Tutorial) | (Tutorial, Lecture)))
    }

    fn schedule_component(
        &mut self,
        group: usize,
        section: usize,
        course: &Course,
        faculty: &str,
        kind: SessionKind,
        minutes: u32,
    ) -> bool {
        let room_kind = if kind == SessionKind::Lab {
            RoomKind::ComputerLab
        } else {
            RoomKind::LectureRoom
        };
        if !self.pools.has_kind(room_kind) {
            return false;
        }
        let capacity = course.students.unwrap_or(DEFAULT_CLASS_SIZE);

        for _ in 0..kind.attempt_limit() {
            let day = self.random_day();
            if self.component_conflict(group, section, day, &course.code, kind) {
                continue;
            }
            for start in self.shuffled_starts(kind) {
                let Some(slots) = self.consecutive_slots(group, section, day, start, minutes, kind) else {
                    continue;
                };
                if !self.professor_free(faculty, day, &slots) {
                    continue;
                }
                let Some(room) = self.find_room(&course.code, room_kind, capacity, day, &slots) else {
                    continue;
                };

                let booking = Booking {
                    kind,
                    code: course.code.clone(),
                    name: course.name.clone(),
                    faculty: faculty.to_string(),
                    room: room.clone(),
                    lab_rooms: Vec::new(),
                    electives: Vec::new(),
                    basket: None,
                };
                self.groups[group].sections[section].place(day, &slots, booking);
                self.mark_room(&room, day, &slots);
                self.mark_professor(faculty, day, &slots);
                return true;
            }
        }
        false
    }

    #[allow(clippy::too_many_arguments)]
    fn record_unscheduled(
        &mut self,
        department: &str,
        semester: u32,
        code: &str,
        name: &str,
        faculty: &str,
        kind: SessionKind,
        reason: &str,
    ) {
        tracing::warn!(
            "⚠️ Could not place {} {} for {} semester {}: {}",
            code,
            kind,
            department,
            semester,
            reason
        );

        if let Some(existing) = self
            .unscheduled
            .iter_mut()
            .find(|u| u.code == code && u.department == department && u.semester == semester)
        {
            if !existing.components.contains(&kind) {
                existing.components.push(kind);
            }
            if !existing.reasons.iter().any(|r| r == reason) {
                existing.reasons.push(reason.to_string());
            }
            return;
        }

        self.unscheduled.push(UnscheduledCourse {
            code: code.to_string(),
            name: name.to_string(),
            department: department.to_string(),
            semester,
            faculty: faculty.to_string(),
            components: vec![kind],
            reasons: vec![reason.to_string()],
        });
    }

    // ---- elective baskets ----

    fn schedule_baskets(&mut self, baskets: &[ElectiveBasket]) {
        let semesters: BTreeSet<u32> = baskets.iter().map(|b| b.semester).collect();

        for semester in semesters {
            let groups: Vec<usize> = (0..self.groups.len())
                .filter(|&g| {
                    self.groups[g].semester == semester
                        && self.config.is_basket_department(&self.groups[g].department)
                })
                .collect();
            if groups.is_empty() {
                tracing::warn!("⚠️ Semester {} has baskets but no basket department teaches it", semester);
                continue;
            }
            let departments: Vec<String> = groups.iter().map(|&g| self.groups[g].department.clone()).collect();
            tracing::info!("🧺 Scheduling semester {} baskets for {}", semester, departments.join(", "));

            let mut taken: Vec<BasketSession> = Vec::new();
            for basket in baskets.iter().filter(|b| b.semester == semester) {
                if basket.electives.is_empty() {
                    tracing::warn!("⚠️ Basket {} of semester {} lists no electives, skipping", basket.label, semester);
                    continue;
                }

                let mut schedule = BasketSchedule {
                    semester,
                    label: basket.label.clone(),
                    departments: departments.clone(),
                    sessions: Vec::new(),
                };

                // lectures on distinct days, tutorials away from them
                let mut blocked = BTreeSet::new();
                let plan = [
                    (SessionKind::Lecture, self.config.basket_lectures, self.config.lecture_min),
                    (SessionKind::Tutorial, self.config.basket_tutorials, self.config.tutorial_min),
                ];
                for (kind, count, minutes) in plan {
                    for _ in 0..count {
                        match self.find_basket_session(basket, &groups, kind, minutes, &blocked, &taken) {
                            Some(session) => {
                                blocked.insert(session.day);
                                self.apply_basket_session(basket, &groups, &session);
                                taken.push(session.clone());
                                schedule.sessions.push(session);
                            }
                            None => {
                                for department in &departments {
                                    self.record_unscheduled(
                                        department,
                                        semester,
                                        &basket.label,
                                        &format!("{} Course", basket.label),
                                        &basket.faculty.join(", "),
                                        kind,
                                        BASKET_FAILURE,
                                    );
                                }
                            }
                        }
                    }
                }
                self.baskets.push(schedule);
            }
        }
    }

    fn find_basket_session(
        &mut self,
        basket: &ElectiveBasket,
        groups: &[usize],
        kind: SessionKind,
        minutes: u32,
        blocked_days: &BTreeSet<usize>,
        taken: &[BasketSession],
    ) -> Option<BasketSession> {
        for _ in 0..JOINT_ATTEMPTS {
            let day = self.random_day();
            if blocked_days.contains(&day) {
                continue;
            }
            for start in self.shuffled_starts(kind) {
                let Some(slots) = self.joint_slots(groups, day, start, minutes, kind) else {
                    continue;
                };
                if clashes_with_baskets(day, &slots, taken) {
                    continue;
                }
                if !basket.faculty.iter().all(|f| self.professor_free(f, day, &slots)) {
                    continue;
                }
                let Some(seats) = self.basket_rooms(basket, day, &slots, taken) else {
                    continue;
                };
                return Some(BasketSession { kind, day, slots, seats });
            }
        }
        None
    }

    /// One room per elective, biggest class first. Over 120 students needs a
    /// large room, over 60 a medium (or large) one.
    fn basket_rooms(
        &mut self,
        basket: &ElectiveBasket,
        day: usize,
        slots: &[usize],
        taken: &[BasketSession],
    ) -> Option<Vec<ElectiveSeat>> {
        let used: BTreeSet<&str> = taken
            .iter()
            .filter(|t| t.day == day)
            .flat_map(|t| t.seats.iter().map(|s| s.room.as_str()))
            .collect();
        let mut available: Vec<String> = self
            .pools
            .basket_pool()
            .into_iter()
            .filter(|r| !used.contains(r.as_str()) && self.room_free(r, day, slots))
            .collect();
        available.shuffle(&mut self.rng);

        let mut order: Vec<usize> = (0..basket.electives.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(basket.count_for(i)));

        let pools = &self.pools;
        let mut seats = Vec::with_capacity(order.len());
        for i in order {
            let count = basket.count_for(i);
            let fits = |room: &String| {
                if count > 120 {
                    pools.large.contains(room)
                } else if count > 60 {
                    pools.medium.contains(room)
                } else {
                    true
                }
            };
            let position = available.iter().position(fits)?;
            seats.push(ElectiveSeat {
                code: basket.electives[i].clone(),
                room: available.remove(position),
                // faculty follow the elective's position in the row, not the sorted order
                faculty: basket.faculty_for(i).to_string(),
                count,
            });
        }
        Some(seats)
    }

    fn apply_basket_session(&mut self, basket: &ElectiveBasket, groups: &[usize], session: &BasketSession) {
        let faculty = if basket.faculty.is_empty() {
            MULTIPLE_FACULTY.to_string()
        } else {
            basket.faculty.join(", ")
        };
        let booking = Booking {
            kind: session.kind,
            code: basket.label.clone(),
            name: format!("{} Course", basket.label),
            faculty,
            room: String::new(),
            lab_rooms: Vec::new(),
            electives: session.seats.clone(),
            basket: Some(basket.label.clone()),
        };

        for &g in groups {
            for grid in &mut self.groups[g].sections {
                grid.place(session.day, &session.slots, booking.clone());
            }
        }
        for seat in &session.seats {
            self.mark_room(&seat.room, session.day, &session.slots);
        }
        for name in &basket.faculty {
            self.mark_professor(name, session.day, &session.slots);
        }
        tracing::debug!(
            "Basket {} {} on day {} slots {:?}",
            basket.label,
            session.kind,
            session.day,
            session.slots
        );
    }

    // ---- auditorium courses ----

    fn schedule_auditorium(&mut self, courses: &[Course]) {
        let mut joint: Vec<(&Course, Vec<String>)> = Vec::new();
        for course in courses.iter().filter(|c| c.auditorium && c.schedule) {
            match joint.iter_mut().find(|(c, _)| c.code == course.code) {
                Some((_, departments)) => {
                    if !departments.contains(&course.department) {
                        departments.push(course.department.clone());
                    }
                }
                None => joint.push((course, vec![course.department.clone()])),
            }
        }

        for (course, departments) in joint {
            let groups: Vec<usize> = (0..self.groups.len())
                .filter(|&g| {
                    self.groups[g].semester == course.semester
                        && departments.contains(&self.groups[g].department)
                })
                .collect();
            tracing::info!("🏟️ Scheduling auditorium course {} for {}", course.code, departments.join(", "));

            let plan = required_sessions(course, self.config);
            let mut used_days = BTreeSet::new();
            let joint_plan = [
                (SessionKind::Lecture, plan.lectures, self.config.lecture_min),
                (SessionKind::Tutorial, plan.tutorials, self.config.tutorial_min),
            ];
            for (kind, count, minutes) in joint_plan {
                for _ in 0..count {
                    match self.place_auditorium_session(course, &groups, kind, minutes, &used_days) {
                        Some(day) => {
                            used_days.insert(day);
                        }
                        None => {
                            for department in &departments {
                                self.record_unscheduled(
                                    department,
                                    course.semester,
                                    &course.code,
                                    &course.name,
                                    &course.faculty,
                                    kind,
                                    kind.failure_reason(),
                                );
                            }
                        }
                    }
                }
            }

            // labs run per department, each on its own day
            for &g in &groups {
                let mut blocked = used_days.clone();
                for _ in 0..plan.labs {
                    match self.place_auditorium_lab(course, g, plan.lab_minutes, &blocked) {
                        Some(day) => {
                            blocked.insert(day);
                        }
                        None => {
                            let department = self.groups[g].department.clone();
                            self.record_unscheduled(
                                &department,
                                course.semester,
                                &course.code,
                                &course.name,
                                &course.faculty,
                                SessionKind::Lab,
                                SessionKind::Lab.failure_reason(),
                            );
                        }
                    }
                }
            }
        }
    }

    fn section_faculty(&self, course: &Course, groups: &[usize]) -> Vec<String> {
        let mut names = Vec::new();
        for &g in groups {
            for grid in &self.groups[g].sections {
                let name = select_faculty(&course.faculty, grid.section);
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    fn place_auditorium_session(
        &mut self,
        course: &Course,
        groups: &[usize],
        kind: SessionKind,
        minutes: u32,
        blocked_days: &BTreeSet<usize>,
    ) -> Option<usize> {
        if self.pools.auditoria.is_empty() || groups.is_empty() {
            return None;
        }
        let faculty = self.section_faculty(course, groups);

        for _ in 0..JOINT_ATTEMPTS {
            let day = self.random_day();
            if blocked_days.contains(&day) {
                continue;
            }
            for start in self.shuffled_starts(kind) {
                let Some(slots) = self.joint_slots(groups, day, start, minutes, kind) else {
                    continue;
                };
                if !faculty.iter().all(|f| self.professor_free(f, day, &slots)) {
                    continue;
                }
                let mut halls = self.pools.auditoria.clone();
                halls.shuffle(&mut self.rng);
                let Some(hall) = halls.into_iter().find(|r| self.room_free(r, day, &slots)) else {
                    continue;
                };
                self.place_joint(course, groups, kind, day, &slots, vec![hall]);
                return Some(day);
            }
        }
        None
    }

    fn place_auditorium_lab(
        &mut self,
        course: &Course,
        group: usize,
        minutes: u32,
        blocked_days: &BTreeSet<usize>,
    ) -> Option<usize> {
        if self.pools.labs.len() < AUDITORIUM_LAB_ROOMS || minutes == 0 {
            return None;
        }
        let groups = [group];
        let faculty = self.section_faculty(course, &groups);

        for _ in 0..JOINT_ATTEMPTS {
            let day = self.random_day();
            if blocked_days.contains(&day) {
                continue;
            }
            for start in self.shuffled_starts(SessionKind::Lab) {
                let Some(slots) = self.joint_slots(&groups, day, start, minutes, SessionKind::Lab) else {
                    continue;
                };
                if !faculty.iter().all(|f| self.professor_free(f, day, &slots)) {
                    continue;
                }
                let mut labs = self.pools.labs.clone();
                labs.shuffle(&mut self.rng);
                let free: Vec<String> = labs
                    .into_iter()
                    .filter(|r| self.room_free(r, day, &slots))
                    .take(AUDITORIUM_LAB_ROOMS)
                    .collect();
                if free.len() < AUDITORIUM_LAB_ROOMS {
                    continue;
                }
                self.place_joint(course, &groups, SessionKind::Lab, day, &slots, free);
                return Some(day);
            }
        }
        None
    }

    fn place_joint(
        &mut self,
        course: &Course,
        groups: &[usize],
        kind: SessionKind,
        day: usize,
        slots: &[usize],
        rooms: Vec<String>,
    ) {
        let mut faculty = Vec::new();
        for &g in groups {
            for grid in &mut self.groups[g].sections {
                let name = select_faculty(&course.faculty, grid.section);
                grid.place(
                    day,
                    slots,
                    Booking {
                        kind,
                        code: course.code.clone(),
                        name: course.name.clone(),
                        faculty: name.clone(),
                        room: rooms.first().cloned().unwrap_or_default(),
                        lab_rooms: if rooms.len() > 1 { rooms.clone() } else { Vec::new() },
                        electives: Vec::new(),
                        basket: None,
                    },
                );
                faculty.push(name);
            }
        }
        for room in &rooms {
            self.mark_room(room, day, slots);
        }
        for name in faculty {
            self.mark_professor(&name, day, slots);
        }
    }

    // ---- regular courses ----

    fn schedule_regular(&mut self, courses: &[Course], basket_semesters: &BTreeSet<u32>) {
        for g in 0..self.groups.len() {
            let department = self.groups[g].department.clone();
            let semester = self.groups[g].semester;
            let drop_electives =
                basket_semesters.contains(&semester) && self.config.is_basket_department(&department);

            let candidates: Vec<&Course> = courses
                .iter()
                .filter(|c| c.department == department && c.semester == semester)
                .filter(|c| c.schedule && !c.auditorium)
                .filter(|c| !(drop_electives && c.is_elective()))
                .collect();
            let ordered = order_courses(candidates);
            tracing::debug!("{} semester {}: {} courses to place", department, semester, ordered.len());

            for s in 0..self.groups[g].sections.len() {
                let letter = self.groups[g].sections[s].section;
                for course in &ordered {
                    let faculty = select_faculty(&course.faculty, letter);
                    let plan = required_sessions(course, self.config);
                    for (kind, minutes) in plan.components(self.config) {
                        if !self.schedule_component(g, s, course, &faculty, kind, minutes) {
                            self.record_unscheduled(
                                &department,
                                semester,
                                &course.code,
                                &course.name,
                                &faculty,
                                kind,
                                kind.failure_reason(),
                            );
                        }
                    }
                }
            }
        }
    }

    fn finish(self, inputs: &ClassInputs) -> ClassTimetable {
        let marks = self
            .slots
            .iter()
            .map(|slot| {
                if is_minor_slot(slot) {
                    SlotMark::Minor
                } else if is_break_slot(slot, None, &self.breaks) {
                    SlotMark::Break
                } else {
                    SlotMark::Open
                }
            })
            .collect();

        let rooms = inputs
            .rooms
            .iter()
            .map(|room| RoomUsage {
                room: room.number.clone(),
                kind: room.kind,
                busy: match self.room_busy.get(&room.number) {
                    Some(week) => week.iter().map(|day| day.iter().copied().collect()).collect(),
                    None => vec![Vec::new(); self.days],
                },
            })
            .collect();

        ClassTimetable {
            days: self.config.days.clone(),
            slots: self.slots,
            marks,
            sections: self.groups.into_iter().flat_map(|g| g.sections).collect(),
            baskets: self.baskets,
            electives: inputs.baskets.clone(),
            rooms,
            unscheduled: self.unscheduled,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

pub fn generate(inputs: &ClassInputs, config: &ScheduleConfig) -> Result<ClassTimetable> {
    config.validate()?;
    if inputs.courses.is_empty() {
        return Err(TimetableError::invalid_input(COURSES_FILE, 1, "no course rows"));
    }

    let mut scheduler = Scheduler::new(inputs, config)?;
    let section_count: usize = scheduler.groups.iter().map(|g| g.sections.len()).sum();
    tracing::info!(
        "🗓️ Scheduling {} sections over {} days x {} slots",
        section_count,
        scheduler.days,
        scheduler.slots.len()
    );

    scheduler.schedule_baskets(&inputs.baskets);
    scheduler.schedule_auditorium(&inputs.courses);
    let basket_semesters: BTreeSet<u32> = inputs.baskets.iter().map(|b| b.semester).collect();
    scheduler.schedule_regular(&inputs.courses, &basket_semesters);

    let timetable = scheduler.finish(inputs);
    tracing::info!(
        "✅ Class timetable ready: {} sections, {} unscheduled courses",
        timetable.sections.len(),
        timetable.unscheduled.len()
    );
    Ok(timetable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn course(department: &str, semester: u32, code: &str, ltps: [u32; 4], faculty: &str) -> Course {
        Course {
            department: department.to_string(),
            semester,
            code: code.to_string(),
            name: format!("{} name", code),
            lecture_hours: ltps[0],
            tutorial_hours: ltps[1],
            lab_hours: ltps[2],
            self_study_hours: ltps[3],
            faculty: faculty.to_string(),
            schedule: true,
            auditorium: false,
            students: None,
        }
    }

    fn room(number: &str, kind: RoomKind, capacity: u32) -> Room {
        Room {
            number: number.to_string(),
            kind,
            capacity,
        }
    }

    fn rooms() -> Vec<Room> {
        let mut rooms: Vec<Room> = (1..=6)
            .map(|i| room(&format!("C10{}", i), RoomKind::LectureRoom, 70))
            .collect();
        rooms.push(room("C201", RoomKind::LectureRoom, 150));
        rooms.push(room("L1", RoomKind::ComputerLab, 40));
        rooms.push(room("L2", RoomKind::ComputerLab, 40));
        rooms.push(room("L3", RoomKind::ComputerLab, 40));
        rooms.push(room("AUD", RoomKind::Seater240, 240));
        rooms
    }

    fn seeded() -> ScheduleConfig {
        ScheduleConfig {
            seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_select_faculty() {
        assert_eq!(select_faculty("Dr. A & Dr. B", 'A'), "Dr. A");
        assert_eq!(select_faculty("Dr. A & Dr. B", 'B'), "Dr. B");
        assert_eq!(select_faculty("Dr. A &", 'B'), "Dr. A");
        assert_eq!(select_faculty("Dr. A / Dr. B", 'B'), "Dr. A");
        assert_eq!(select_faculty("Dr. A; Dr. B", 'A'), "Dr. A");
        assert_eq!(select_faculty("nan", 'A'), TBD);
        assert_eq!(select_faculty("  ", 'A'), TBD);
    }

    #[test]
    fn test_split_faculty_names() {
        assert_eq!(split_faculty_names("Dr. A, Dr. B"), vec!["Dr. A", "Dr. B"]);
        assert_eq!(split_faculty_names("Dr. A & Dr. B"), vec!["Dr. A", "Dr. B"]);
        assert!(split_faculty_names("None").is_empty());
    }

    #[test]
    fn test_required_sessions() {
        let config = ScheduleConfig::default();
        let plan = required_sessions(&course("CSE", 3, "CS301", [3, 1, 2, 1], "A"), &config);
        assert_eq!(
            plan,
            SessionPlan {
                lectures: 2,
                tutorials: 1,
                labs: 1,
                self_study: 1,
                lab_minutes: 120,
            }
        );
        let kinds: Vec<SessionKind> = plan.components(&config).into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec![
                SessionKind::Lecture,
                SessionKind::Lecture,
                SessionKind::Tutorial,
                SessionKind::Lab,
                SessionKind::SelfStudy
            ]
        );
    }

    #[test]
    fn test_slot_classification() {
        let config = ScheduleConfig::default();
        let breaks = config.breaks().unwrap();
        let slots = config.time_slots();

        assert!(is_minor_slot(&slots[0]));
        assert!(is_minor_slot(&slots[23]));
        assert!(!is_minor_slot(&slots[1]));
        // 10:30-10:45 morning break
        assert!(is_break_slot(&slots[4], None, &breaks));
        // 15:30-15:40 only breaks lectures and tutorials
        assert!(is_break_slot(&slots[16], Some(SessionKind::Lecture), &breaks));
        assert!(!is_break_slot(&slots[16], Some(SessionKind::Lab), &breaks));
        assert!(!is_break_slot(&slots[16], None, &breaks));
        assert!(is_lecture_unfriendly(&slots[21]));
        assert!(!is_lecture_unfriendly(&slots[20]));
    }

    #[test]
    fn test_order_courses_puts_electives_then_priority() {
        let heavy = course("CSE", 3, "CS301", [3, 1, 2, 0], "A");
        let light = course("CSE", 3, "CS302", [2, 0, 0, 0], "B");
        let mut elective = course("CSE", 3, "CS399", [3, 0, 0, 0], "C");
        elective.name = "Open Elective".to_string();
        let duplicate = light.clone();

        let ordered = order_courses(vec![&heavy, &light, &elective, &duplicate]);
        let codes: Vec<&str> = ordered.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["CS399", "CS302", "CS301"]);
    }

    fn assert_grid_invariants(timetable: &ClassTimetable) {
        let mut starts: HashMap<(String, usize), Vec<usize>> = HashMap::new();

        for grid in &timetable.sections {
            for row in &grid.cells {
                for (slot, cell) in row.iter().enumerate() {
                    if !cell.is_free() {
                        assert_eq!(timetable.marks[slot], SlotMark::Open, "{} uses a blocked slot", grid.title());
                    }
                }
            }
            for session in grid.sessions() {
                let booking = session.booking;
                if booking.kind == SessionKind::Lecture {
                    assert!(!is_lecture_unfriendly(&timetable.slots[session.start]));
                }
                if booking.basket.is_none() && tracks_professor(&booking.faculty) {
                    starts
                        .entry((booking.faculty.clone(), session.day))
                        .or_default()
                        .push(session.start);
                }
            }
        }

        for mut day_starts in starts.into_values() {
            day_starts.sort_unstable();
            day_starts.dedup();
            for pair in day_starts.windows(2) {
                let gap = (timetable.slots[pair[1]].start - timetable.slots[pair[0]].start).num_minutes();
                assert!(gap >= MIN_PROFESSOR_GAP_MIN, "starts {:?} too close", pair);
            }
        }
    }

    fn assert_rooms_single_use(timetable: &ClassTimetable) {
        // per (room, day, slot) the distinct course codes must be one
        let mut holders: HashMap<(String, usize, usize), HashSet<String>> = HashMap::new();
        for grid in &timetable.sections {
            for session in grid.sessions() {
                for room in session.booking.rooms() {
                    for slot in session.slots() {
                        holders
                            .entry((room.to_string(), session.day, slot))
                            .or_default()
                            .insert(format!("{}:{}", session.booking.code, session.booking.kind));
                    }
                }
            }
        }
        for (key, codes) in holders {
            assert_eq!(codes.len(), 1, "room double-booked at {:?}: {:?}", key, codes);
        }
    }

    #[test]
    fn test_generate_respects_grid_invariants() {
        let courses = vec![
            course("CSE", 3, "CS301", [3, 1, 2, 0], "Dr. A & Dr. B"),
            course("CSE", 3, "CS302", [3, 1, 0, 1], "Dr. C"),
            course("CSE", 3, "CS303", [2, 0, 0, 0], "Dr. A"),
            course("ECE", 3, "EC301", [3, 1, 2, 0], "Dr. D"),
            course("ECE", 3, "EC302", [3, 0, 0, 0], "Dr. C"),
        ];
        let inputs = ClassInputs {
            courses,
            rooms: rooms(),
            baskets: vec![],
        };
        let timetable = generate(&inputs, &seeded()).unwrap();

        assert_eq!(timetable.section_titles(), vec!["CSE_3_A", "CSE_3_B", "ECE_3"]);
        assert_grid_invariants(&timetable);
        assert_rooms_single_use(&timetable);

        let placed: usize = timetable.sections.iter().map(|s| s.sessions().len()).sum();
        assert!(placed > 10);
    }

    #[test]
    fn test_same_seed_same_timetable() {
        let inputs = ClassInputs {
            courses: vec![
                course("CSE", 5, "CS501", [3, 1, 0, 0], "Dr. A"),
                course("CSE", 5, "CS502", [3, 0, 2, 0], "Dr. B"),
            ],
            rooms: rooms(),
            baskets: vec![],
        };
        let first = generate(&inputs, &seeded()).unwrap();
        let second = generate(&inputs, &seeded()).unwrap();
        assert_eq!(first.sections, second.sections);
    }

    #[test]
    fn test_lecture_never_shares_day_with_its_tutorial() {
        let inputs = ClassInputs {
            courses: vec![course("ME", 1, "ME101", [3, 2, 0, 0], "Dr. M")],
            rooms: rooms(),
            baskets: vec![],
        };
        let timetable = generate(&inputs, &seeded()).unwrap();
        let grid = &timetable.sections[0];
        for day in 0..timetable.days.len() {
            let kinds: Vec<SessionKind> = grid
                .sessions()
                .iter()
                .filter(|s| s.day == day)
                .map(|s| s.booking.kind)
                .collect();
            let lectures = kinds.iter().filter(|k| **k == SessionKind::Lecture).count();
            assert!(lectures <= 1);
            if lectures == 1 {
                assert!(!kinds.contains(&SessionKind::Tutorial));
            }
        }
    }

    #[test]
    fn test_missing_rooms_are_reported_unscheduled() {
        let inputs = ClassInputs {
            courses: vec![course("CSE", 3, "CS301", [3, 1, 2, 0], "Dr. A")],
            rooms: vec![],
            baskets: vec![],
        };
        let timetable = generate(&inputs, &seeded()).unwrap();

        // sections A and B share one record
        assert_eq!(timetable.unscheduled.len(), 1);
        let record = &timetable.unscheduled[0];
        assert_eq!(
            record.components,
            vec![SessionKind::Lecture, SessionKind::Tutorial, SessionKind::Lab]
        );
        assert_eq!(
            record.reasons,
            vec!["Number of collisions exceeded limit", "No slot available", "Lab not scheduled"]
        );
    }

    #[test]
    fn test_baskets_land_in_every_basket_section() {
        let mut elective = course("CSE", 5, "CS599", [3, 0, 0, 0], "Dr. X");
        elective.name = "Program Elective".to_string();
        let inputs = ClassInputs {
            courses: vec![
                course("CSE", 5, "CS501", [3, 1, 0, 0], "Dr. A"),
                course("ECE", 5, "EC501", [3, 1, 0, 0], "Dr. B"),
                elective,
            ],
            rooms: rooms(),
            baskets: vec![ElectiveBasket {
                semester: 5,
                label: "B1".to_string(),
                electives: vec!["CS551".to_string(), "CS552".to_string()],
                faculty: vec!["Dr. P".to_string(), "Dr. Q".to_string()],
                rooms_per_slot: 2,
                counts: vec![40, 130],
            }],
        };
        let timetable = generate(&inputs, &seeded()).unwrap();

        let basket = &timetable.baskets[0];
        assert_eq!(basket.sessions.len(), 3);
        let lecture_days: HashSet<usize> = basket
            .sessions
            .iter()
            .filter(|s| s.kind == SessionKind::Lecture)
            .map(|s| s.day)
            .collect();
        assert_eq!(lecture_days.len(), 2);
        for tutorial in basket.sessions.iter().filter(|s| s.kind == SessionKind::Tutorial) {
            assert!(!lecture_days.contains(&tutorial.day));
        }

        for session in &basket.sessions {
            // the 130-seat elective needs the large room and keeps its own faculty
            let big = session.seats.iter().find(|s| s.code == "CS552").unwrap();
            assert_eq!(big.room, "C201");
            assert_eq!(big.faculty, "Dr. Q");
            for grid in &timetable.sections {
                let booking = grid.cells[session.day][session.slots[0]].booking().unwrap();
                assert_eq!(booking.basket.as_deref(), Some("B1"));
            }
        }

        // electives of a basket semester are not placed as regular courses
        assert!(timetable
            .sections
            .iter()
            .all(|g| g.sessions().iter().all(|s| s.booking.code != "CS599")));
        assert_rooms_single_use(&timetable);
    }

    #[test]
    fn test_mid_size_electives_take_medium_rooms() {
        for seed in 1..=8 {
            let inputs = ClassInputs {
                courses: vec![course("CSE", 7, "CS701", [3, 0, 0, 0], "Dr. A")],
                rooms: rooms(),
                baskets: vec![ElectiveBasket {
                    semester: 7,
                    label: "B2".to_string(),
                    electives: vec!["CS771".to_string(), "CS772".to_string()],
                    faculty: vec!["Dr. P".to_string(), "Dr. Q".to_string()],
                    rooms_per_slot: 2,
                    counts: vec![90, 30],
                }],
            };
            let config = ScheduleConfig {
                seed: Some(seed),
                ..Default::default()
            };
            let timetable = generate(&inputs, &config).unwrap();

            let basket = &timetable.baskets[0];
            assert!(!basket.sessions.is_empty(), "seed {}", seed);
            for session in &basket.sessions {
                let seat = session.seats.iter().find(|s| s.code == "CS771").unwrap();
                // C201 seats 150, the C10x rooms seat 70
                assert_ne!(seat.room, "C201", "seed {}", seed);
                assert!(seat.room.starts_with("C10"), "seed {}: {}", seed, seat.room);
            }
        }
    }

    #[test]
    fn test_auditorium_course_shares_slots_across_departments() {
        let mut joint_cse = course("CSE", 1, "MA101", [3, 0, 2, 0], "Dr. M & Dr. N");
        joint_cse.auditorium = true;
        let mut joint_ece = joint_cse.clone();
        joint_ece.department = "ECE".to_string();

        let inputs = ClassInputs {
            courses: vec![joint_cse, joint_ece],
            rooms: rooms(),
            baskets: vec![],
        };
        let timetable = generate(&inputs, &seeded()).unwrap();
        assert!(timetable.unscheduled.is_empty(), "{:?}", timetable.unscheduled);

        let lectures = |title: &str| -> Vec<(usize, usize)> {
            timetable
                .section(title)
                .unwrap()
                .sessions()
                .iter()
                .filter(|s| s.booking.kind == SessionKind::Lecture)
                .map(|s| (s.day, s.start))
                .collect()
        };
        assert_eq!(lectures("CSE_1_A").len(), 2);
        assert_eq!(lectures("CSE_1_A"), lectures("CSE_1_B"));
        assert_eq!(lectures("CSE_1_A"), lectures("ECE_1"));

        let section_b = timetable.section("CSE_1_B").unwrap().sessions();
        let lecture = section_b.iter().find(|s| s.booking.kind == SessionKind::Lecture).unwrap();
        assert_eq!(lecture.booking.room, "AUD");
        assert_eq!(lecture.booking.faculty, "Dr. N");

        let lab = section_b.iter().find(|s| s.booking.kind == SessionKind::Lab).unwrap();
        assert_eq!(lab.booking.lab_rooms.len(), 2);
    }

    #[test]
    fn test_empty_courses_rejected() {
        let err = generate(&ClassInputs::default(), &seeded()).unwrap_err();
        assert!(err.to_string().contains(COURSES_FILE));
    }
}
