pub(crate) mod crossfade;
