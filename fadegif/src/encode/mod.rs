pub(crate) mod gif_sink;
pub(crate) mod sink;
