pub mod pet;

pub use pet::PetService;
