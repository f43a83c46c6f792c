use subhub_core::{Entity, ProductId, SubscriptionId, UserId};

/// Entity: Subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    id: SubscriptionId,
    is_active: bool,
    user_id: UserId,
    product_id: ProductId,
}

impl Subscription {
    pub fn new(id: SubscriptionId, is_active: bool, user_id: UserId, product_id: ProductId) -> Self {
        Self {
            id,
            is_active,
            user_id,
            product_id,
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }
}

impl Entity for Subscription {
    type Id = SubscriptionId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
