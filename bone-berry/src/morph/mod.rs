//! 二值形态学操作.
//!
//! 切片上的操作 (`*_2d`) 使用圆盘结构元素和 4-邻接;
//! 体数据上的操作 (`*_3d`, `*_box`) 使用盒形结构元素和 6-邻接.
//! 所有操作都不修改输入, 而是返回新的掩膜.

mod element;
mod plane;
mod volume;

pub use element::{BoxElement, Element2d};

pub use plane::{areas_2d, closing_2d, dilate_2d, erode_2d, remove_small_objects_2d, Area2d};

pub use volume::{
    areas_3d, closing_box, dilate_box, erode_box, fill_holes_3d, remove_small_objects_3d, Area3d,
};
