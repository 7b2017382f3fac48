pub mod place;

pub use place::{
    category_display_name, Address, Coordinates, Place, PlaceDetails, PlaceGroup, PlaceId, Review,
};
