// 領域層：資料模型與 ports 介面，不含網路程式碼

pub mod model;
pub mod ports;
