mod detail;
mod list;
mod logs;

pub use detail::draw_detail;
pub use list::draw_list;
pub use logs::draw_logs;
