/// Coordinate systems a cine frame can be addressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    /// Array indices (column, row, slice).
    Pixel,
    /// Millimetres along the image's own row, column and normal axes.
    Image,
    /// Patient coordinates, as used by Image Position (Patient).
    World,
}
