pub mod message;
pub mod tag;
pub mod thread;

pub use message::MongoMessageRepository;
pub use tag::MongoTagRepository;
pub use thread::MongoThreadRepository;
