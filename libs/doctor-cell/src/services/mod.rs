pub mod doctor;
pub mod holiday;
pub mod schedule;
pub mod slots;

pub use doctor::DoctorService;
pub use holiday::HolidayService;
pub use schedule::ScheduleService;
pub use slots::SlotService;
